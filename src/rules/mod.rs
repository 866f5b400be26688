//! Rules trait for game implementations.
//!
//! Games implement `Rules` to define:
//! - Board layout and per-player state
//! - The phase transition table for their opcodes
//! - How opcodes and `Done` commits modify the board
//! - Legal moves, evaluation and win conditions
//!
//! The engine calls into `Rules` but never interprets game-specific
//! concepts directly.

pub mod engine;

pub use engine::{GameResult, Rules};
