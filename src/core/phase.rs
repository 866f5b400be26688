//! Shared shape of per-game phase enums.
//!
//! Each game declares its own phase enum, but every one of them carries the
//! same structural landmarks: a free-edit `Puzzle` phase, a `Resign` phase
//! waiting for confirmation, and a terminal `GameOver` phase. The engine's
//! standardized control opcodes only ever move between those landmarks and
//! whatever phase `Rules::start_phase` names.

use std::fmt::Debug;
use std::hash::Hash;

/// A game's phase enum.
pub trait PhaseKind: Copy + Eq + Hash + Debug + 'static {
    /// Free-edit phase entered by the `Edit` control.
    fn puzzle() -> Self;

    /// Phase entered by the first `Resign` control.
    fn resign() -> Self;

    /// Terminal phase.
    fn game_over() -> Self;

    /// Stable small integer folded into the digest.
    ///
    /// Reordering a game's phases changes every stored digest, so ordinals
    /// are written out explicitly rather than derived from declaration order.
    fn ordinal(self) -> u32;

    /// True when a `Done` commit is actionable.
    fn done_state(self) -> bool;

    /// True when the digest of this phase is meaningful for repetition checks.
    fn digest_state(self) -> bool {
        self.done_state()
    }

    /// True when players may act out of turn with ephemeral moves.
    fn simultaneous_turns_allowed(self) -> bool {
        false
    }

    fn is_puzzle(self) -> bool {
        self == Self::puzzle()
    }

    fn is_resign(self) -> bool {
        self == Self::resign()
    }

    fn is_game_over(self) -> bool {
        self == Self::game_over()
    }
}
