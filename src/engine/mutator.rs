//! Logged board mutation.
//!
//! `Mutator` is the only write path into a `Board` while a move executes.
//! Every method that changes state pushes the matching `UndoRecord` first,
//! so rules code gets exact undo for free.

use smallvec::SmallVec;
use tracing::trace;

use crate::board::{Board, CellId, InFlight};
use crate::core::{EngineError, EngineResult, PhaseKind, PlayerId};
use crate::rules::Rules;

use super::log::UndoRecord;

/// Write access to a board for the duration of one move.
pub struct Mutator<'a, R: Rules> {
    board: &'a mut Board<R>,
    pub(crate) captured: SmallVec<[R::Token; 2]>,
}

impl<'a, R: Rules> Mutator<'a, R> {
    pub(crate) fn new(board: &'a mut Board<R>) -> Self {
        Self {
            board,
            captured: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board<R> {
        self.board
    }

    #[must_use]
    pub fn rules(&self) -> &R {
        &self.board.rules
    }

    fn log(&mut self, record: UndoRecord<R>) {
        trace!(?record, "undo record");
        self.board.log.push(record);
    }

    // === Tokens ===

    /// Remove the token at `height` of `cell`.
    pub fn take(&mut self, cell: CellId, height: usize) -> EngineResult<R::Token> {
        let idx = self.board.cell_index(cell)?;
        let token = self.board.cells[idx]
            .remove(height)
            .ok_or(EngineError::EmptyCell(cell))?;
        self.log(UndoRecord::Removed {
            cell: idx,
            height,
            token,
        });
        Ok(token)
    }

    /// Remove the top token of `cell`.
    pub fn take_top(&mut self, cell: CellId) -> EngineResult<R::Token> {
        let height = self.board.cell(cell)?.height();
        if height == 0 {
            return Err(EngineError::EmptyCell(cell));
        }
        self.take(cell, height - 1)
    }

    /// Insert a token at `height` of `cell`.
    pub fn insert(&mut self, cell: CellId, height: usize, token: R::Token) -> EngineResult<()> {
        let idx = self.board.cell_index(cell)?;
        let target = &mut self.board.cells[idx];
        if target.is_full() {
            return Err(EngineError::CellFull(cell));
        }
        if height > target.height() {
            return Err(EngineError::EmptyCell(cell));
        }
        target.insert(height, token);
        self.log(UndoRecord::Inserted { cell: idx, height });
        Ok(())
    }

    /// Put a token on top of `cell`.
    pub fn push(&mut self, cell: CellId, token: R::Token) -> EngineResult<()> {
        let height = self.board.cell(cell)?.height();
        self.insert(cell, height, token)
    }

    /// Move the top token of `from` onto `to`.
    pub fn move_top(&mut self, from: CellId, to: CellId) -> EngineResult<R::Token> {
        let token = self.take_top(from)?;
        self.push(to, token)?;
        self.animate(from, to);
        Ok(token)
    }

    /// Like [`Mutator::move_top`], and reports the token as captured.
    pub fn capture(&mut self, from: CellId, to: CellId) -> EngineResult<R::Token> {
        let token = self.move_top(from, to)?;
        self.captured.push(token);
        Ok(token)
    }

    // === Pick and drop ===

    /// Lift the top token of `cell` into flight.
    pub fn pick(&mut self, cell: CellId) -> EngineResult<R::Token> {
        if self.board.picked.is_some() {
            return Err(EngineError::AlreadyPicked);
        }
        let height = self
            .board
            .cell(cell)?
            .height()
            .checked_sub(1)
            .ok_or(EngineError::EmptyCell(cell))?;
        let token = self.take(cell, height)?;
        self.set_picked(Some(InFlight {
            token,
            source: cell,
            height,
        }));
        Ok(token)
    }

    /// Land the in-flight token on top of `cell`.
    pub fn drop_on(&mut self, cell: CellId) -> EngineResult<InFlight<R::Token>> {
        let flight = self.board.picked.ok_or(EngineError::NothingPicked)?;
        if cell == flight.source {
            self.insert(cell, flight.height, flight.token)?;
        } else {
            self.push(cell, flight.token)?;
            self.animate(flight.source, cell);
        }
        self.set_picked(None);
        Ok(flight)
    }

    /// Return the in-flight token to where it was lifted from.
    pub fn unpick(&mut self) -> EngineResult<()> {
        let flight = self.board.picked.ok_or(EngineError::NothingPicked)?;
        self.insert(flight.source, flight.height, flight.token)?;
        self.set_picked(None);
        Ok(())
    }

    fn set_picked(&mut self, picked: Option<InFlight<R::Token>>) {
        let prev = std::mem::replace(&mut self.board.picked, picked);
        self.log(UndoRecord::Picked { prev });
    }

    // === Phase and turn ===

    /// Change phase. Entering any phase but game-over clears win flags.
    pub fn set_phase(&mut self, phase: R::Phase) {
        if phase != self.board.phase {
            let prev = std::mem::replace(&mut self.board.phase, phase);
            self.log(UndoRecord::Phase { prev });
        }
        if !phase.is_game_over() {
            for p in PlayerId::all(self.board.player_count()) {
                self.set_win(p, false);
            }
        }
    }

    pub fn set_turn(&mut self, player: PlayerId) {
        if player != self.board.turn {
            let prev = std::mem::replace(&mut self.board.turn, player);
            self.log(UndoRecord::Turn { prev });
        }
    }

    /// Pass the turn to the next seat.
    pub fn next_turn(&mut self) {
        let next = self.board.turn.next(self.board.player_count());
        self.set_turn(next);
    }

    pub fn bump_move_number(&mut self) {
        let prev = self.board.move_number;
        self.board.move_number += 1;
        self.log(UndoRecord::MoveNumber { prev });
    }

    pub(crate) fn set_resign_from(&mut self, phase: Option<R::Phase>) {
        if phase != self.board.resign_from {
            let prev = std::mem::replace(&mut self.board.resign_from, phase);
            self.log(UndoRecord::ResignFrom { prev });
        }
    }

    // === Per-game state ===

    pub fn update_player(&mut self, player: PlayerId, f: impl FnOnce(&mut R::PlayerState)) {
        let prev = self.board.players[player].clone();
        f(&mut self.board.players[player]);
        if self.board.players[player] != prev {
            self.log(UndoRecord::PlayerState { player, prev });
        }
    }

    pub fn update_shared(&mut self, f: impl FnOnce(&mut R::Shared)) {
        let prev = self.board.shared.clone();
        f(&mut self.board.shared);
        if self.board.shared != prev {
            self.log(UndoRecord::Shared { prev });
        }
    }

    pub fn set_win(&mut self, player: PlayerId, won: bool) {
        let prev = std::mem::replace(&mut self.board.wins[player], won);
        if prev != won {
            self.log(UndoRecord::Win { player, prev });
        }
    }

    // === Hints ===

    /// Record a `(from, to)` animation hint. Not part of undo.
    pub fn animate(&mut self, from: CellId, to: CellId) {
        if self.board.animate {
            self.board.animations.push((from, to));
        }
    }
}

impl<R: Rules> Board<R> {
    /// Revert one record. Only the engine's undo path calls this.
    pub(crate) fn revert(&mut self, record: UndoRecord<R>) {
        match record {
            UndoRecord::Removed { cell, height, token } => self.cells[cell].insert(height, token),
            UndoRecord::Inserted { cell, height } => {
                self.cells[cell].remove(height);
            }
            UndoRecord::Picked { prev } => self.picked = prev,
            UndoRecord::Phase { prev } => self.phase = prev,
            UndoRecord::Turn { prev } => self.turn = prev,
            UndoRecord::PlayerState { player, prev } => self.players[player] = prev,
            UndoRecord::Shared { prev } => self.shared = prev,
            UndoRecord::Win { player, prev } => self.wins[player] = prev,
            UndoRecord::MoveNumber { prev } => self.move_number = prev,
            UndoRecord::ResignFrom { prev } => self.resign_from = prev,
        }
    }
}
