//! Execute and undo.
//!
//! ## Execute
//!
//! 1. Check the command against the phase transition table. An illegal
//!    transition is a protocol violation.
//! 2. Open an undo mark carrying the move's fingerprint.
//! 3. Dispatch: controls are handled here, game opcodes go to
//!    `Rules::execute`.
//! 4. On error, revert every record above the mark, drop the mark and the
//!    animation hints the move pushed. A rejected move leaves no trace.
//!
//! ## Undo
//!
//! Strictly LIFO. The move handed to `undo` must be the one the top mark was
//! opened for; anything else is `UndoOutOfOrder`.
//!
//! ## Strictness
//!
//! With `EngineConfig::strict` set, protocol violations panic instead of
//! returning. Rule rejections always return.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::core::{EngineError, EngineResult, PhaseKind, PlayerId};
use crate::moves::{Command, Move, Opcode};
use crate::rules::Rules;

use super::mutator::Mutator;

/// What one `execute` did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect<T, P> {
    /// Undo-log serial assigned to the move.
    pub serial: u64,
    pub phase_before: P,
    pub phase_after: P,
    pub turn_after: PlayerId,
    /// Tokens moved by a capture.
    pub captured: SmallVec<[T; 2]>,
    /// Undo records the move pushed.
    pub records: usize,
}

impl<T, P: PartialEq> Effect<T, P> {
    #[must_use]
    pub fn changed_phase(&self) -> bool {
        self.phase_before != self.phase_after
    }
}

/// `Effect` for a board type.
pub type BoardEffect<R> = Effect<<R as Rules>::Token, <R as Rules>::Phase>;

impl<R: Rules> Board<R> {
    /// True if the current phase accepts `mv`'s command.
    #[must_use]
    pub fn accepts(&self, mv: &Move<R::Op>) -> bool {
        self.check_transition(mv).is_ok()
    }

    fn check_transition(&self, mv: &Move<R::Op>) -> EngineResult<()> {
        let phase = self.phase;
        let legal = match &mv.command {
            Command::Start(first) => first.index() < self.player_count(),
            Command::Edit | Command::GameOverOnTime => true,
            Command::Resign => !phase.is_puzzle() && !phase.is_game_over(),
            Command::Done => phase.done_state() || phase.is_resign(),
            Command::Game(op) => {
                (!op.is_ephemeral() || phase.simultaneous_turns_allowed())
                    && R::legal_in_phase(phase, op)
            }
        };
        if legal && mv.player.index() < self.player_count() {
            Ok(())
        } else {
            Err(EngineError::IllegalTransition {
                phase: format!("{phase:?}"),
                opcode: mv.opcode_name().to_string(),
            })
        }
    }

    /// Apply `mv`, recording exact undo information.
    ///
    /// # Panics
    ///
    /// Panics on a protocol violation when the board is strict.
    pub fn execute(&mut self, mv: &Move<R::Op>) -> EngineResult<BoardEffect<R>> {
        let outcome = self.try_execute(mv);
        if let Err(err) = &outcome {
            self.on_violation(err);
        }
        outcome
    }

    fn try_execute(&mut self, mv: &Move<R::Op>) -> EngineResult<BoardEffect<R>> {
        self.check_transition(mv)?;

        let phase_before = self.phase;
        let animations_before = self.animations.len();
        let mark = self.log.begin(mv.fingerprint());

        let mut m = Mutator::new(self);
        let outcome = dispatch(&mut m, mv);
        let captured = std::mem::take(&mut m.captured);

        match outcome {
            Ok(()) => {
                let effect = Effect {
                    serial: mark.serial,
                    phase_before,
                    phase_after: self.phase,
                    turn_after: self.turn,
                    captured,
                    records: self.log.len() - mark.start,
                };
                debug!(serial = mark.serial, mv = %mv, records = effect.records, "executed");
                if effect.changed_phase() {
                    info!(from = ?phase_before, to = ?self.phase, "phase change");
                }
                Ok(effect)
            }
            Err(err) => {
                self.revert_top();
                self.animations.truncate(animations_before);
                warn!(mv = %mv, error = %err, "move rejected");
                Err(err)
            }
        }
    }

    /// Undo `mv`, which must be the most recently executed move.
    ///
    /// # Panics
    ///
    /// Panics on out-of-order undo when the board is strict.
    pub fn undo(&mut self, mv: &Move<R::Op>) -> EngineResult<()> {
        let outcome = self.try_undo(mv);
        if let Err(err) = &outcome {
            self.on_violation(err);
        }
        outcome
    }

    fn try_undo(&mut self, mv: &Move<R::Op>) -> EngineResult<()> {
        let top = *self.log.top().ok_or(EngineError::NothingToUndo)?;
        if top.fingerprint != mv.fingerprint() {
            return Err(EngineError::UndoOutOfOrder {
                expected: format!("move #{}", top.serial),
                found: mv.to_text(),
            });
        }
        self.revert_top();
        debug!(serial = top.serial, mv = %mv, "undone");
        Ok(())
    }

    fn revert_top(&mut self) {
        if let Some(mark) = self.log.pop_mark() {
            while let Some(record) = self.log.pop_record_above(mark.start) {
                self.revert(record);
            }
        }
    }

    fn on_violation(&self, err: &EngineError) {
        if err.is_protocol_violation() && self.config.strict {
            panic!("protocol violation: {err}");
        }
    }
}

fn dispatch<R: Rules>(m: &mut Mutator<'_, R>, mv: &Move<R::Op>) -> EngineResult<()> {
    let player = mv.player;
    match &mv.command {
        Command::Start(first) => {
            if m.board().picked().is_some() {
                m.unpick()?;
            }
            m.set_turn(*first);
            m.set_resign_from(None);
            let phase = R::start_phase(m.board());
            m.set_phase(phase);
            Ok(())
        }
        Command::Edit => {
            if m.board().picked().is_some() {
                m.unpick()?;
            }
            m.set_resign_from(None);
            m.set_phase(R::Phase::puzzle());
            Ok(())
        }
        Command::Resign => {
            let phase = m.board().phase();
            if phase.is_resign() {
                let back = m.board().resign_from().unwrap_or_else(|| R::start_phase(m.board()));
                m.set_resign_from(None);
                m.set_phase(back);
            } else {
                m.set_resign_from(Some(phase));
                m.set_phase(R::Phase::resign());
            }
            Ok(())
        }
        Command::Done => {
            if m.board().phase().is_resign() {
                let winner = m.board().turn().next(m.board().player_count());
                m.set_resign_from(None);
                m.set_win(winner, true);
                m.set_phase(R::Phase::game_over());
                Ok(())
            } else {
                R::on_done(m, player)
            }
        }
        Command::GameOverOnTime => {
            let winner = m.board().turn();
            m.set_win(winner, true);
            m.set_phase(R::Phase::game_over());
            Ok(())
        }
        Command::Game(op) => R::execute(m, player, op),
    }
}
