//! Rules trait for game implementations.
//!
//! Games implement `Rules` to define:
//! - The board layout and starting tokens
//! - Which opcodes each phase accepts
//! - How each opcode mutates the board (through a `Mutator`)
//! - What a `Done` commit does
//! - Legal move generation, evaluation and win conditions
//!
//! Everything a game mutates goes through the `Mutator`, which logs an undo
//! record for each primitive change. A game never touches undo bookkeeping
//! itself and never writes an inverse for its own opcodes.

use std::fmt::Debug;

use crate::board::{Board, CellId, Digestible, Layout, Token};
use crate::core::{EngineResult, InitSpec, PhaseKind, PlayerId};
use crate::engine::Mutator;
use crate::moves::{Move, NameTable, Opcode};

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Multiple winners (shared victory).
    Winners(Vec<PlayerId>),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => *p == player,
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }

    /// Build a result from the players flagged as winners.
    #[must_use]
    pub fn from_winners(mut winners: Vec<PlayerId>) -> Self {
        match winners.len() {
            0 => GameResult::Draw,
            1 => GameResult::Winner(winners[0]),
            _ => {
                winners.sort();
                GameResult::Winners(winners)
            }
        }
    }
}

/// Per-game policy plugged into the generic board.
///
/// ## Implementation Notes
///
/// - `execute` and `on_done` must be deterministic: replay and robot
///   search depend on it.
/// - Returning an error from `execute` or `on_done` after partial mutation
///   is fine; the engine rolls the move back.
/// - `legal_moves` should only produce moves `execute` accepts.
pub trait Rules: Clone + Debug + Sized + 'static {
    type Token: Token;
    type Phase: PhaseKind;
    type Op: Opcode;
    type PlayerState: Clone + Debug + PartialEq + Digestible;
    type Shared: Clone + Debug + PartialEq + Digestible;

    /// Zone names used in move text.
    const ZONES: NameTable;

    /// Build the rule set for an init string (variant, players, revision).
    fn new(init: &InitSpec) -> EngineResult<Self>;

    /// Add cells and starting tokens. Dealing draws from `layout.rng()`.
    fn layout(&self, init: &InitSpec, layout: &mut Layout<Self::Token>) -> EngineResult<()>;

    fn initial_player_state(&self, player: PlayerId) -> Self::PlayerState;

    fn initial_shared(&self) -> Self::Shared;

    /// Phase entered by the `Start` control.
    fn start_phase(board: &Board<Self>) -> Self::Phase;

    /// Transition table for game opcodes.
    fn legal_in_phase(phase: Self::Phase, op: &Self::Op) -> bool;

    /// Apply a game opcode.
    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &Self::Op) -> EngineResult<()>;

    /// Apply a `Done` commit outside the resign phase.
    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()>;

    // === Legality queries ===

    fn is_legal_to_pick(_board: &Board<Self>, _player: PlayerId, _cell: CellId) -> bool {
        false
    }

    fn is_legal_to_drop(_board: &Board<Self>, _player: PlayerId, _cell: CellId) -> bool {
        false
    }

    /// Complete moves `player` could make now, for robots and tests.
    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<Self::Op>>;

    /// The player expected to act next. Simultaneous phases override this to
    /// name a player who has not yet committed.
    fn mover(board: &Board<Self>) -> PlayerId {
        board.turn()
    }

    // === Simultaneous play ===

    /// Whether `player` has locked in its part of a simultaneous phase.
    fn has_committed(_board: &Board<Self>, _player: PlayerId) -> bool {
        true
    }

    /// Cells whose contents `viewer` cannot see.
    fn concealed_cells(_board: &Board<Self>, _viewer: PlayerId) -> Vec<CellId> {
        Vec::new()
    }

    // === Outcome ===

    /// Static evaluation from `player`'s point of view. Larger is better.
    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64;

    /// `Some` once the game has ended.
    fn result(board: &Board<Self>) -> Option<GameResult> {
        if !board.phase().is_game_over() {
            return None;
        }
        let winners = board
            .wins()
            .iter()
            .filter(|(_, won)| **won)
            .map(|(p, _)| p)
            .collect();
        Some(GameResult::from_winners(winners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_result_is_winner() {
        let result = GameResult::Winner(PlayerId::new(1));
        assert!(!result.is_winner(PlayerId::new(0)));
        assert!(result.is_winner(PlayerId::new(1)));

        let draw = GameResult::Draw;
        assert!(!draw.is_winner(PlayerId::new(0)));

        let team = GameResult::Winners(vec![PlayerId::new(0), PlayerId::new(2)]);
        assert!(team.is_winner(PlayerId::new(0)));
        assert!(!team.is_winner(PlayerId::new(1)));
        assert!(team.is_winner(PlayerId::new(2)));
    }

    #[test]
    fn test_from_winners() {
        assert_eq!(GameResult::from_winners(vec![]), GameResult::Draw);
        assert_eq!(
            GameResult::from_winners(vec![PlayerId::new(2)]),
            GameResult::Winner(PlayerId::new(2))
        );
        assert_eq!(
            GameResult::from_winners(vec![PlayerId::new(2), PlayerId::new(0)]),
            GameResult::Winners(vec![PlayerId::new(0), PlayerId::new(2)])
        );
    }
}
