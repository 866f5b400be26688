//! Core engine types: players, RNG, configuration, errors and phases.
//!
//! Everything here is game-agnostic. Games plug their own tokens, phases
//! and opcodes in through the traits in `board`, `core::phase`, `moves`
//! and `rules`.

pub mod config;
pub mod error;
pub mod phase;
pub mod player;
pub mod rng;

pub use config::{EngineConfig, InitSpec, Revision, DEFAULT_DIGEST_SEED};
pub use error::{EngineError, EngineResult};
pub use phase::PhaseKind;
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
