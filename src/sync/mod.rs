//! Simultaneous-play reconciliation.
//!
//! Players act independently with ephemeral moves during a simultaneous
//! phase; the `Reconciler` buffers those moves and later converts them into
//! one canonical, ordered run of permanent moves that every participant
//! computes identically.

pub mod reconciler;

pub use reconciler::{Canonicalized, Reconciler};
