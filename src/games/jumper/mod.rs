//! "Jumper", a small jump-capture game for exercising the engine.
//!
//! - A 5x5 board; each player starts with a rack of stones
//!   (4 with two players, 3 with three or four)
//! - Placement: on your turn put one stone from your rack on an empty square
//! - Play: once every rack is empty, slide a stone to an adjacent empty
//!   square or jump an adjacent enemy stone to capture it
//! - Every move is confirmed with `Done`
//! - A player with no stones left loses; so does a player with no move
//!
//! Supports 2-4 players. Moves can be made as a single `Move` or as a
//! `Pick` followed by a `Drop`; dropping back on the source cancels.

mod game;

pub use game::{Jumper, JumperOp, JumperPhase, Step, Stone, BOARD, CAPTURES, RACK, SIZE};
