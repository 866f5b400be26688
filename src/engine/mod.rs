//! Execute/undo engine.
//!
//! - `log`: the single undo log of tagged records and per-move marks
//! - `mutator`: the logged write path rules code mutates the board through
//! - `execute`: phase checks, control opcodes, rollback and LIFO undo

pub mod execute;
pub mod log;
pub mod mutator;

pub use execute::{BoardEffect, Effect};
pub use log::{Mark, UndoLog, UndoRecord};
pub use mutator::Mutator;
