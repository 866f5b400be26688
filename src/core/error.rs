//! Engine error taxonomy.
//!
//! Three families:
//! - **Protocol violations**: an opcode illegal for the current phase,
//!   malformed move text, or undo out of LIFO order. The caller was supposed
//!   to filter with the legality queries first, so these indicate a contract
//!   bug between the UI/network layer and the engine.
//! - **Rule rejections**: the per-game policy refused a move (for example a
//!   drop on an occupied cell). The board is never left partially mutated.
//! - **Digest mismatches**: replay did not reproduce the live board.

use thiserror::Error;

use crate::board::CellId;

/// Errors produced by the engine and the per-game rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("illegal transition: {opcode} is not legal in phase {phase}")]
    IllegalTransition { phase: String, opcode: String },

    #[error("malformed move text {text:?}: {reason}")]
    MalformedMove { text: String, reason: String },

    #[error("unknown opcode {0:?}")]
    UnknownOpcode(String),

    #[error("undo out of order: expected {expected}, got {found}")]
    UndoOutOfOrder { expected: String, found: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("move {mv} rejected: {reason}")]
    Rejected { mv: String, reason: String },

    #[error("ephemeral move {0} is only accepted during a simultaneous phase")]
    NotSimultaneous(String),

    #[error("move {0} is not ephemeral")]
    NotEphemeral(String),

    #[error("no such cell {0}")]
    UnknownCell(CellId),

    #[error("cell {0} has no token at that height")]
    EmptyCell(CellId),

    #[error("cell {0} is full")]
    CellFull(CellId),

    #[error("a token is already in flight")]
    AlreadyPicked,

    #[error("no token in flight")]
    NothingPicked,

    #[error("bad init string {text:?}: {reason}")]
    BadInit { text: String, reason: String },

    #[error("digest mismatch: expected {expected:#018x}, got {actual:#018x}")]
    DigestMismatch { expected: u64, actual: u64 },

    #[error("encoding failed: {0}")]
    Encode(String),
}

impl EngineError {
    /// True for errors that mean the caller broke the engine contract.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            EngineError::IllegalTransition { .. }
                | EngineError::MalformedMove { .. }
                | EngineError::UnknownOpcode(_)
                | EngineError::UndoOutOfOrder { .. }
                | EngineError::NothingToUndo
        )
    }

    pub(crate) fn rejected(mv: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        EngineError::Rejected {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(text: &str, reason: impl Into<String>) -> Self {
        EngineError::MalformedMove {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type EngineResult<T> = Result<T, EngineError>;
