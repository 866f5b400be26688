//! The robot's private board.
//!
//! Robots never touch the live board. `SearchBoard::prepare` clones it,
//! turns off animation hints, and unwinds any buffered ephemeral moves so
//! the search does not see choices other players have not locked in.
//! Search then drives `execute`/`undo` directly through `make_move` and
//! `unmake_move`; after a balanced sequence the board is bit-identical to
//! where it started, which `verify_balanced` checks by digest.
//!
//! Hidden information (a face-down pile) is handled by `re_randomize`,
//! which shuffles the viewer's concealed cells with a recorded permutation,
//! and `undo_re_randomize`, which restores them.

use tracing::error;

use crate::board::Board;
use crate::core::{EngineError, EngineResult, GameRng, PhaseKind, PlayerId};
use crate::moves::{Command, Move};
use crate::rules::{GameResult, Rules};
use crate::sync::Reconciler;

#[derive(Clone, Debug)]
struct Made<O> {
    mv: Move<O>,
    /// `Done` executed on the mover's behalf right after `mv`.
    auto_done: Option<Move<O>>,
}

/// A cloned board with make/unmake and re-randomization.
#[derive(Clone, Debug)]
pub struct SearchBoard<R: Rules> {
    board: Board<R>,
    viewer: PlayerId,
    made: Vec<Made<R::Op>>,
    /// `made.len()` when each outstanding re-randomization happened.
    shuffled_at: Vec<usize>,
    start_digest: u64,
    verify: bool,
}

impl<R: Rules> SearchBoard<R> {
    /// Clone `live` for `viewer`, stripping the reconciler's buffered moves.
    pub fn prepare(live: &Board<R>, reconciler: &Reconciler<R::Op>, viewer: PlayerId) -> EngineResult<Self> {
        let mut board = live.clone();
        board.set_animate(false);
        reconciler.strip(&mut board)?;
        Ok(Self::from_board(board, viewer))
    }

    /// Wrap an already-private board.
    #[must_use]
    pub fn from_board(mut board: Board<R>, viewer: PlayerId) -> Self {
        board.set_animate(false);
        let verify = board.config().verify_search_digests;
        let start_digest = board.digest();
        Self {
            board,
            viewer,
            made: Vec::new(),
            shuffled_at: Vec::new(),
            start_digest,
            verify,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board<R> {
        &self.board
    }

    #[must_use]
    pub fn viewer(&self) -> PlayerId {
        self.viewer
    }

    /// Moves made and not yet unmade.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.made.len()
    }

    #[must_use]
    pub fn start_digest(&self) -> u64 {
        self.start_digest
    }

    #[must_use]
    pub fn mover(&self) -> PlayerId {
        R::mover(&self.board)
    }

    #[must_use]
    pub fn legal_moves(&self) -> Vec<Move<R::Op>> {
        R::legal_moves(&self.board, self.mover())
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        R::result(&self.board)
    }

    #[must_use]
    pub fn evaluate(&self, player: PlayerId) -> f64 {
        R::evaluate(&self.board, player)
    }

    /// Execute `mv`, committing with `Done` if it leaves a sequential
    /// done-state, the way a robot confirms its own move.
    pub fn make_move(&mut self, mv: &Move<R::Op>) -> EngineResult<()> {
        self.board.execute(mv)?;
        let phase = self.board.phase();
        let auto_done = if phase.done_state()
            && !phase.simultaneous_turns_allowed()
            && !phase.is_resign()
            && mv.command != Command::Done
        {
            let done = Move::done(self.board.turn());
            if let Err(err) = self.board.execute(&done) {
                self.board.undo(mv)?;
                return Err(err);
            }
            Some(done)
        } else {
            None
        };
        self.made.push(Made {
            mv: mv.clone(),
            auto_done,
        });
        Ok(())
    }

    /// Undo `mv`, which must be the last move made.
    pub fn unmake_move(&mut self, mv: &Move<R::Op>) -> EngineResult<()> {
        let Some(made) = self.made.last() else {
            return Err(EngineError::NothingToUndo);
        };
        if !made.mv.same_move(mv) {
            return Err(EngineError::UndoOutOfOrder {
                expected: made.mv.to_text(),
                found: mv.to_text(),
            });
        }
        if self.shuffled_at.last().is_some_and(|&at| at == self.made.len()) {
            return Err(EngineError::UndoOutOfOrder {
                expected: "undo_re_randomize".to_string(),
                found: mv.to_text(),
            });
        }
        let Some(made) = self.made.pop() else {
            return Err(EngineError::NothingToUndo);
        };
        if let Some(done) = &made.auto_done {
            self.board.undo(done)?;
        }
        self.board.undo(&made.mv)?;
        if self.verify {
            self.verify_balanced()?;
        }
        Ok(())
    }

    /// Shuffle the tokens `viewer` cannot see.
    pub fn re_randomize(&mut self, rng: &mut GameRng) -> EngineResult<()> {
        let cells = R::concealed_cells(&self.board, self.viewer);
        self.board.shuffle_cells(&cells, rng)?;
        self.shuffled_at.push(self.made.len());
        Ok(())
    }

    /// Restore the cells shuffled by the latest `re_randomize`.
    pub fn undo_re_randomize(&mut self) -> EngineResult<()> {
        match self.shuffled_at.last() {
            None => return Err(EngineError::NothingToUndo),
            Some(&at) if at != self.made.len() => {
                return Err(EngineError::UndoOutOfOrder {
                    expected: format!("{} unmade moves first", self.made.len() - at),
                    found: "undo_re_randomize".to_string(),
                })
            }
            Some(_) => {}
        }
        self.shuffled_at.pop();
        self.board.unshuffle()?;
        if self.verify {
            self.verify_balanced()?;
        }
        Ok(())
    }

    /// With nothing outstanding, the digest must equal the starting digest.
    pub fn verify_balanced(&self) -> EngineResult<()> {
        if !self.made.is_empty() || !self.shuffled_at.is_empty() {
            return Ok(());
        }
        let actual = self.board.digest();
        if actual != self.start_digest {
            error!(expected = self.start_digest, actual, "search board drifted after balanced make/unmake");
            return Err(EngineError::DigestMismatch {
                expected: self.start_digest,
                actual,
            });
        }
        Ok(())
    }
}
