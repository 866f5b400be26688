//! The single-threaded run loop owner.
//!
//! A `Session` is one participant's view of a game: the live board, the
//! permanent history, the ephemeral buffer and a logical clock. Every
//! event (a local UI move, a move delivered from another participant, a
//! timeout, a robot's chosen move) is fed through one of these methods and
//! fully processed before the next.

use tracing::debug;

use crate::board::{Board, CellId};
use crate::core::{EngineConfig, EngineResult, InitSpec, PlayerId};
use crate::engine::BoardEffect;
use crate::history::{History, Recorded};
use crate::moves::Move;
use crate::rules::Rules;
use crate::search::SearchBoard;
use crate::sync::{Canonicalized, Reconciler};

#[derive(Clone, Debug)]
pub struct Session<R: Rules> {
    board: Board<R>,
    history: History<R::Op>,
    reconciler: Reconciler<R::Op>,
    clock: u64,
}

impl<R: Rules> Session<R> {
    pub fn new(init: InitSpec, config: EngineConfig) -> EngineResult<Self> {
        let board = Board::new(init, config)?;
        let history = History::for_board(&board);
        Ok(Self {
            board,
            history,
            reconciler: Reconciler::new(),
            clock: 0,
        })
    }

    pub fn from_init_text(text: &str, config: EngineConfig) -> EngineResult<Self> {
        Self::new(text.parse()?, config)
    }

    #[must_use]
    pub fn board(&self) -> &Board<R> {
        &self.board
    }

    #[must_use]
    pub fn history(&self) -> &History<R::Op> {
        &self.history
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler<R::Op> {
        &self.reconciler
    }

    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Process one move.
    ///
    /// Ephemeral moves go to the buffer. Permanent moves run beneath any
    /// buffered ephemeral moves and are recorded in history.
    pub fn perform(&mut self, mv: Move<R::Op>) -> EngineResult<BoardEffect<R>> {
        if mv.is_ephemeral() {
            return self.reconciler.submit(&mut self.board, mv);
        }

        let now = self.tick();
        let history = &mut self.history;
        let record = mv.clone();
        self.reconciler.with_unwound(&mut self.board, |board| {
            let effect = board.execute(&mv)?;
            if let Recorded::Collapsed(removed) = history.record(record, board.digest(), now) {
                debug!(removed = %removed.mv, "move cancelled the previous entry");
            }
            Ok(effect)
        })
    }

    /// Parse and process a move in wire form.
    pub fn perform_text(&mut self, text: &str, player: PlayerId) -> EngineResult<BoardEffect<R>> {
        let mv = Move::parse(text, player)?;
        self.perform(mv)
    }

    /// Remove the last permanent move.
    ///
    /// The board is rebuilt by replaying the remaining history, so this also
    /// works across collapsed entries. The replay runs on a fresh board; if it
    /// fails, the history and the live board are left as they were.
    pub fn undo_last(&mut self) -> EngineResult<Option<Move<R::Op>>> {
        let Some(keep) = self.history.len().checked_sub(1) else {
            return Ok(None);
        };
        let entries = &self.history.entries()[..keep];
        self.reconciler.with_unwound(&mut self.board, |board| {
            let mut rebuilt = Board::new(board.init().clone(), board.config().clone())?;
            rebuilt.set_animate(false);
            for e in entries {
                rebuilt.execute(&e.mv)?;
            }
            rebuilt.set_animate(board.animate);
            *board = rebuilt;
            Ok(())
        })?;
        Ok(self.history.pop().map(|entry| entry.mv))
    }

    /// Submit-side retraction of `player`'s latest ephemeral move.
    pub fn retract(&mut self, player: PlayerId) -> EngineResult<Option<Move<R::Op>>> {
        self.reconciler.retract(&mut self.board, player)
    }

    /// Canonicalize if `me` is the current player and everyone has committed.
    pub fn canonicalize_if_ready(&mut self, me: PlayerId) -> EngineResult<Option<Canonicalized<R::Op>>> {
        if !self.reconciler.should_canonicalize(&self.board, me) {
            return Ok(None);
        }
        self.receive_commit().map(Some)
    }

    /// The round was committed (locally or by the current player elsewhere):
    /// canonicalize now. Idempotent.
    pub fn receive_commit(&mut self) -> EngineResult<Canonicalized<R::Op>> {
        let now = self.tick();
        self.reconciler
            .canonicalize(&mut self.board, &mut self.history, now)
    }

    /// This participant's buffered moves for `player`, ready to transmit.
    #[must_use]
    pub fn snapshot(&self, player: PlayerId) -> String {
        self.reconciler.snapshot(player)
    }

    /// Replace `from`'s buffered moves with a received snapshot.
    pub fn absorb(&mut self, from: PlayerId, text: &str) -> EngineResult<usize> {
        self.reconciler.absorb(&mut self.board, from, text)
    }

    /// Replay history against the board with ephemeral moves set aside.
    pub fn verify_replay(&mut self) -> EngineResult<()> {
        let history = &self.history;
        self.reconciler
            .with_unwound(&mut self.board, |board| history.verify_replay(board))
    }

    pub fn take_animations(&mut self) -> Vec<(CellId, CellId)> {
        self.board.take_animations()
    }

    /// A private robot board for `viewer`.
    pub fn prepare_robot(&self, viewer: PlayerId) -> EngineResult<SearchBoard<R>> {
        SearchBoard::prepare(&self.board, &self.reconciler, viewer)
    }
}
