//! # rust-tabletop
//!
//! A deterministic game-state engine for turn-based and simultaneous board
//! games, built for networked play and robot search.
//!
//! ## Design Principles
//!
//! 1. **Execute/Undo Is Exact**: every move is applied through a logged
//!    mutator, and `undo` restores the board bit-for-bit. Robots search by
//!    making and unmaking moves on a private board.
//!
//! 2. **Digests Are the Truth**: a 64-bit content digest summarizes the
//!    whole board. Replays and search are checked against it.
//!
//! 3. **Moves Are Text**: every move has a canonical wire form
//!    (`[seq] opcode operand...`) that parses back to an equal move.
//!
//! 4. **Order-Independent Simultaneous Play**: moves made at once by several
//!    players are buffered and converted to one canonical permanent sequence
//!    that does not depend on network delivery order.
//!
//! ## Modules
//!
//! - `core`: players, RNG, phases, configuration and errors
//! - `moves`: move descriptors, opcode tables, text codec
//! - `board`: cells, token stacks, the generic `Board` and its digest
//! - `engine`: execute/undo, the undo log and the `Mutator`
//! - `rules`: the `Rules` trait games implement
//! - `history`: permanent move history, collapse and replay verification
//! - `sync`: the simultaneous-play `Reconciler`
//! - `session`: one participant's run loop
//! - `search`: robot search boards, alpha-beta and Monte Carlo
//! - `games`: reference games

pub mod board;
pub mod core;
pub mod engine;
pub mod games;
pub mod history;
pub mod moves;
pub mod rules;
pub mod search;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, EngineError, EngineResult, GameRng, InitSpec, PhaseKind, PlayerId, PlayerMap,
    Revision,
};

pub use crate::moves::{Command, Move, MoveReader, MoveWriter, NameTable, Opcode};

pub use crate::board::{Board, Cell, CellId, Digestible, Digester, InFlight, Layout, Token, ZoneId};

pub use crate::engine::{BoardEffect, Effect, Mutator};

pub use crate::rules::{GameResult, Rules};

pub use crate::history::{History, HistoryEntry, Recorded};

pub use crate::sync::{Canonicalized, Reconciler};

pub use crate::session::Session;

pub use crate::search::{AlphaBeta, MonteCarlo, SearchBoard, SearchConfig, SearchStats};
