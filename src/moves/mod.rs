//! Move descriptors and their wire text.
//!
//! - `names`: bidirectional `name <-> code` tables
//! - `descriptor`: the `Opcode` trait, `Command` and `Move`
//! - `text`: operand writer/reader shared by every game

pub mod descriptor;
pub mod names;
pub mod text;

pub use descriptor::{Command, Move, Opcode, CONTROL_NAMES};
pub use names::NameTable;
pub use text::{MoveReader, MoveWriter};
