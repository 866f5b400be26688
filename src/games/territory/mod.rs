//! "Territory", a two-player enclosure game with a simultaneous setup.
//!
//! - A 5x5 board; each player has a supply of 12 stones
//! - Setup: both players at once put 2 stones on empty points of their own
//!   two home rows, then lock them in with `SetupDone`. Once both have,
//!   the current player commits the round with `Done`
//! - Play: on your turn place a stone on an empty point or pass. Enemy
//!   groups left without an empty neighbor are captured; a stone that
//!   would have no empty neighbor and captures nothing may not be placed
//! - Every move is confirmed with `Done`
//! - The game ends when both players pass in a row or every supply is
//!   empty. Stones plus empty regions bordered only by your stones score
//!
//! Setup moves made during the simultaneous round are `EPlace` and
//! `ESetupDone`; they become `Place` and `SetupDone` in the permanent record.

mod game;

pub use game::{
    Group, Settler, Stone, Territory, TerritoryOp, TerritoryPhase, BOARD, PRISONERS, SETUP_STONES, SIZE, SUPPLY,
    SUPPLY_STONES,
};
