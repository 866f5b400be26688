//! "Route", a small game around one shared train.
//!
//! - Six stations on a line; every station but the first holds parcels
//! - Players walk between neighbouring stations, wait on a platform,
//!   ride the train and get off to collect a parcel
//! - On your turn you may instead run the train 1-3 stops; anyone waiting
//!   where it stops gets on
//! - When every parcel is collected, the largest total wins
//!
//! Train motion is the pure function [`advance_simulated_time`]. What the
//! train does at the end of the line depends on the rules revision in the
//! init string: revision 0 sends it back to the first station, revision 1
//! and later reverse it.

mod game;
mod train;

pub use game::{Parcel, Rider, Route, RouteOp, RoutePhase, BAG, MAX_RUN, PARCELS_PER_STATION, STATION, STATIONS};
pub use train::{advance_simulated_time, Train, REVERSING_TERMINUS};
