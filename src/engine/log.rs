//! The undo log.
//!
//! One append-only log of small tagged records replaces the parallel undo
//! stacks a board would otherwise keep in lock-step. Each executed move
//! opens a [`Mark`]; every primitive change made while the move runs pushes
//! one [`UndoRecord`]. Undoing a move pops its mark and reverts the records
//! above `mark.start` newest first.
//!
//! Backed by `im::Vector` so robot boards clone in O(1).

use im::Vector;

use crate::board::InFlight;
use crate::core::PlayerId;
use crate::rules::Rules;

/// The inverse information for one primitive change.
#[derive(Clone, Debug)]
pub enum UndoRecord<R: Rules> {
    /// A token was removed from `cell` at `height`.
    Removed { cell: usize, height: usize, token: R::Token },
    /// A token was inserted into `cell` at `height`.
    Inserted { cell: usize, height: usize },
    Picked { prev: Option<InFlight<R::Token>> },
    Phase { prev: R::Phase },
    Turn { prev: PlayerId },
    PlayerState { player: PlayerId, prev: R::PlayerState },
    Shared { prev: R::Shared },
    Win { player: PlayerId, prev: bool },
    MoveNumber { prev: u32 },
    ResignFrom { prev: Option<R::Phase> },
}

/// Start of one executed move in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark {
    /// Monotonic per board, never reused.
    pub serial: u64,
    /// `Move::fingerprint` of the executed move.
    pub fingerprint: u64,
    /// Record count when the move began.
    pub start: usize,
}

#[derive(Clone, Debug)]
pub struct UndoLog<R: Rules> {
    records: Vector<UndoRecord<R>>,
    marks: Vector<Mark>,
    next_serial: u64,
}

impl<R: Rules> Default for UndoLog<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rules> UndoLog<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vector::new(),
            marks: Vector::new(),
            next_serial: 1,
        }
    }

    /// Open a mark for a move about to execute.
    pub fn begin(&mut self, fingerprint: u64) -> Mark {
        let mark = Mark {
            serial: self.next_serial,
            fingerprint,
            start: self.records.len(),
        };
        self.next_serial += 1;
        self.marks.push_back(mark);
        mark
    }

    pub fn push(&mut self, record: UndoRecord<R>) {
        self.records.push_back(record);
    }

    #[must_use]
    pub fn top(&self) -> Option<&Mark> {
        self.marks.last()
    }

    pub fn pop_mark(&mut self) -> Option<Mark> {
        self.marks.pop_back()
    }

    /// Pop the newest record at or above `start`.
    pub fn pop_record_above(&mut self, start: usize) -> Option<UndoRecord<R>> {
        if self.records.len() > start {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Number of open marks (executed, not yet undone moves).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
