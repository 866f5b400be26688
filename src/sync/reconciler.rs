//! Simultaneous-play reconciliation.
//!
//! ## Buffer
//!
//! During a phase with `simultaneous_turns_allowed`, ephemeral moves from
//! any player are executed on the local board and kept in a buffer together
//! with the undo serial `execute` assigned them. Buffered moves are always
//! the newest moves on the board's undo log, so the buffer can be unwound
//! and re-applied at will:
//!
//! - permanent moves arriving mid-phase run *beneath* the buffer
//!   ([`Reconciler::with_unwound`])
//! - a retraction unwinds, drops one move and re-applies the rest
//! - a retransmitted snapshot from another participant replaces that
//!   player's buffered moves wholesale
//!
//! ## Canonicalization
//!
//! The canonical sequence is the buffer sorted by player index (stable, so
//! each player's own order survives), transmitted moves only, mapped through
//! `Opcode::to_synchronous`. It depends only on which moves each player
//! made, never on delivery order. Canonicalizing unwinds the buffer,
//! executes the canonical moves as permanent history, and commits with
//! `Done` when the phase asks for it. A second attempt after the phase has
//! moved on is a no-op.

use tracing::{debug, info, warn};

use crate::board::Board;
use crate::core::{EngineError, EngineResult, PhaseKind, PlayerId};
use crate::engine::BoardEffect;
use crate::history::History;
use crate::moves::{Move, Opcode};
use crate::rules::Rules;

const SNAPSHOT_SEPARATOR: char = ';';

#[derive(Clone, Debug, PartialEq, Eq)]
struct Buffered<O> {
    mv: Move<O>,
    serial: u64,
}

/// Outcome of [`Reconciler::canonicalize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Canonicalized<O> {
    /// Permanent moves executed and recorded, in order.
    Applied(Vec<Move<O>>),
    /// The phase already left the simultaneous regime.
    AlreadyCanonical,
}

/// Local buffer of ephemeral moves for one participant.
#[derive(Clone, Debug)]
pub struct Reconciler<O> {
    buffer: Vec<Buffered<O>>,
}

impl<O: Opcode> Default for Reconciler<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Opcode> Reconciler<O> {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffered moves in local execution order.
    pub fn buffered(&self) -> impl Iterator<Item = &Move<O>> {
        self.buffer.iter().map(|b| &b.mv)
    }

    /// Buffered moves of one player, oldest first.
    pub fn buffered_by(&self, player: PlayerId) -> impl Iterator<Item = &Move<O>> {
        self.buffered().filter(move |mv| mv.player == player)
    }

    /// Execute an ephemeral move and buffer it.
    pub fn submit<R: Rules<Op = O>>(&mut self, board: &mut Board<R>, mv: Move<O>) -> EngineResult<BoardEffect<R>> {
        if !mv.is_ephemeral() {
            return Err(EngineError::NotEphemeral(mv.to_text()));
        }
        if !board.phase().simultaneous_turns_allowed() {
            return Err(EngineError::NotSimultaneous(mv.to_text()));
        }
        debug_assert!(self
            .buffer
            .last()
            .map_or(true, |b| board.top_serial() == Some(b.serial)));
        let effect = board.execute(&mv)?;
        self.buffer.push(Buffered {
            mv,
            serial: effect.serial,
        });
        Ok(effect)
    }

    /// Undo the buffered moves on `board`, newest first, keeping the buffer.
    fn unwind<R: Rules<Op = O>>(&self, board: &mut Board<R>) -> EngineResult<()> {
        for b in self.buffer.iter().rev() {
            if board.top_serial() != Some(b.serial) {
                return Err(EngineError::UndoOutOfOrder {
                    expected: format!("move #{}", b.serial),
                    found: format!("move #{}", board.top_serial().unwrap_or(0)),
                });
            }
            board.undo(&b.mv)?;
        }
        Ok(())
    }

    /// Re-execute `moves` on top of `board`, rebuilding the buffer.
    ///
    /// Moves the board no longer accepts are dropped and logged.
    fn reapply<R: Rules<Op = O>>(&mut self, board: &mut Board<R>, moves: Vec<Move<O>>) -> usize {
        self.buffer.clear();
        let mut dropped = 0;
        for mv in moves {
            if !board.accepts(&mv) {
                warn!(mv = %mv, player = %mv.player, "dropping ephemeral move the phase no longer accepts");
                dropped += 1;
                continue;
            }
            match board.execute(&mv) {
                Ok(effect) => self.buffer.push(Buffered {
                    mv,
                    serial: effect.serial,
                }),
                Err(err) => {
                    warn!(mv = %mv, player = %mv.player, error = %err, "dropping ephemeral move on re-apply");
                    dropped += 1;
                }
            }
        }
        dropped
    }

    fn take_moves(&mut self) -> Vec<Move<O>> {
        self.buffer.drain(..).map(|b| b.mv).collect()
    }

    /// Undo the buffered moves on a board without touching this reconciler.
    ///
    /// Robot boards use this on a private clone to discard information other
    /// players have not locked in.
    pub fn strip<R: Rules<Op = O>>(&self, board: &mut Board<R>) -> EngineResult<()> {
        self.unwind(board)
    }

    /// Run `f` with the buffer unwound, then re-apply it.
    pub fn with_unwound<R, T>(
        &mut self,
        board: &mut Board<R>,
        f: impl FnOnce(&mut Board<R>) -> EngineResult<T>,
    ) -> EngineResult<T>
    where
        R: Rules<Op = O>,
    {
        if self.buffer.is_empty() {
            return f(board);
        }
        self.unwind(board)?;
        let moves = self.take_moves();
        let result = f(board);
        self.reapply(board, moves);
        result
    }

    /// Withdraw `player`'s most recent buffered move.
    pub fn retract<R: Rules<Op = O>>(&mut self, board: &mut Board<R>, player: PlayerId) -> EngineResult<Option<Move<O>>> {
        let Some(pos) = self.buffer.iter().rposition(|b| b.mv.player == player) else {
            return Ok(None);
        };
        self.unwind(board)?;
        let mut moves = self.take_moves();
        let removed = moves.remove(pos);
        self.reapply(board, moves);
        debug!(mv = %removed, player = %player, "retracted ephemeral move");
        Ok(Some(removed))
    }

    /// `player`'s transmitted buffered moves for wholesale retransmission.
    #[must_use]
    pub fn snapshot(&self, player: PlayerId) -> String {
        self.buffered_by(player)
            .filter(|mv| mv.is_transmitted())
            .map(Move::to_text)
            .collect::<Vec<_>>()
            .join(&format!(" {SNAPSHOT_SEPARATOR} "))
    }

    /// Replace `from`'s buffered moves with a received snapshot.
    ///
    /// The snapshot is parsed and checked before anything is unwound. Returns
    /// how many of the received moves were applied.
    pub fn absorb<R: Rules<Op = O>>(&mut self, board: &mut Board<R>, from: PlayerId, text: &str) -> EngineResult<usize> {
        let received = text
            .split(SNAPSHOT_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Move::<O>::parse(s, from).map(Move::without_index))
            .collect::<EngineResult<Vec<_>>>()?;
        if let Some(mv) = received.iter().find(|mv| !mv.is_ephemeral()) {
            return Err(EngineError::NotEphemeral(mv.to_text()));
        }
        if !received.is_empty() && !board.phase().simultaneous_turns_allowed() {
            return Err(EngineError::NotSimultaneous(text.to_string()));
        }

        self.unwind(board)?;
        let mut moves: Vec<Move<O>> = self
            .take_moves()
            .into_iter()
            .filter(|mv| mv.player != from)
            .collect();
        let offered = received.len();
        moves.extend(received);
        let dropped = self.reapply(board, moves);
        let applied = self.buffered_by(from).count();
        debug!(from = %from, offered, applied, dropped, "absorbed snapshot");
        Ok(applied)
    }

    /// Whether every player has locked in, as far as this board knows.
    #[must_use]
    pub fn all_committed<R: Rules<Op = O>>(&self, board: &Board<R>) -> bool {
        PlayerId::all(board.player_count()).all(|p| R::has_committed(board, p))
    }

    /// True when `me` is the designated current player and sees everyone ready.
    #[must_use]
    pub fn should_canonicalize<R: Rules<Op = O>>(&self, board: &Board<R>, me: PlayerId) -> bool {
        board.phase().simultaneous_turns_allowed() && board.turn() == me && self.all_committed(board)
    }

    /// The permanent sequence the buffer stands for.
    #[must_use]
    pub fn canonical_sequence(&self) -> Vec<Move<O>> {
        let mut moves: Vec<&Move<O>> = self.buffered().filter(|mv| mv.is_transmitted()).collect();
        moves.sort_by_key(|mv| mv.player);
        moves.into_iter().filter_map(Move::to_synchronous).collect()
    }

    /// Turn the buffer into permanent history.
    ///
    /// Atomic: if any canonical move fails, the board, the history and the
    /// buffer are restored and the error is returned.
    pub fn canonicalize<R: Rules<Op = O>>(
        &mut self,
        board: &mut Board<R>,
        history: &mut History<O>,
        now: u64,
    ) -> EngineResult<Canonicalized<O>> {
        if !board.phase().simultaneous_turns_allowed() {
            return Ok(Canonicalized::AlreadyCanonical);
        }

        let canonical = self.canonical_sequence();
        let saved_history = history.clone();
        self.unwind(board)?;
        let buffered = self.take_moves();

        let mut applied: Vec<Move<O>> = Vec::with_capacity(canonical.len() + 1);
        let mut failure = None;
        for mv in canonical {
            if let Err(err) = board.execute(&mv) {
                failure = Some(err);
                break;
            }
            history.record(mv.clone(), board.digest(), now);
            applied.push(mv);
        }
        if failure.is_none() && board.phase().simultaneous_turns_allowed() && board.phase().done_state() {
            let done = Move::done(board.turn());
            match board.execute(&done) {
                Ok(_) => {
                    history.record(done.clone(), board.digest(), now);
                    applied.push(done);
                }
                Err(err) => failure = Some(err),
            }
        }

        if let Some(err) = failure {
            for mv in applied.iter().rev() {
                board.undo(mv)?;
            }
            *history = saved_history;
            self.reapply(board, buffered);
            warn!(error = %err, "canonicalization failed; buffer restored");
            return Err(err);
        }

        info!(moves = applied.len(), phase = ?board.phase(), "canonicalized simultaneous moves");
        Ok(Canonicalized::Applied(applied))
    }
}
