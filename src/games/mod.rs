//! Reference games built on the engine.
//!
//! - [`jumper`]: turn-based board game with pick/drop and captures
//! - [`auction`]: simultaneous sealed bidding over a hidden pile
//! - [`route`]: shared-vehicle game with simulated time and a rules revision
//! - [`territory`]: enclosure game opened by a simultaneous setup round

pub mod auction;
pub mod jumper;
pub mod route;
pub mod territory;
