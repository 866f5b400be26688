//! Cells and their token stacks.
//!
//! A cell is a fixed location (board square, rack slot, pile) identified by
//! zone, column and row. Cells never move; tokens move between them. Each
//! cell holds a stack of tokens, bottom first.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifies a group of cells: the main board, a rack, a pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u16);

/// Location of a cell.
///
/// Columns are letters; rows are integers and may be zero or negative for
/// off-board racks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId {
    pub zone: ZoneId,
    pub col: char,
    pub row: i32,
}

impl CellId {
    #[must_use]
    pub const fn new(zone: ZoneId, col: char, row: i32) -> Self {
        Self { zone, col, row }
    }

    /// The cell `dc` columns and `dr` rows away in the same zone.
    #[must_use]
    pub fn offset(self, dc: i32, dr: i32) -> Option<Self> {
        let col = u32::try_from(self.col as i32 + dc).ok().and_then(char::from_u32)?;
        Some(Self {
            zone: self.zone,
            col,
            row: self.row + dr,
        })
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}:{}{}", self.zone.0, self.col, self.row)
    }
}

/// A cell and its token stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell<T> {
    id: CellId,
    stack: SmallVec<[T; 4]>,
    capacity: Option<usize>,
}

impl<T: Copy> Cell<T> {
    pub(crate) fn new(id: CellId, capacity: Option<usize>) -> Self {
        Self {
            id,
            stack: SmallVec::new(),
            capacity,
        }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.stack.len() >= cap)
    }

    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    #[must_use]
    pub fn top(&self) -> Option<T> {
        self.stack.last().copied()
    }

    #[must_use]
    pub fn get(&self, height: usize) -> Option<T> {
        self.stack.get(height).copied()
    }

    /// Tokens bottom first.
    #[must_use]
    pub fn tokens(&self) -> &[T] {
        &self.stack
    }

    pub(crate) fn insert(&mut self, height: usize, token: T) {
        self.stack.insert(height, token);
    }

    pub(crate) fn remove(&mut self, height: usize) -> Option<T> {
        (height < self.stack.len()).then(|| self.stack.remove(height))
    }

    pub(crate) fn replace_all(&mut self, tokens: impl IntoIterator<Item = T>) {
        self.stack.clear();
        self.stack.extend(tokens);
    }
}

/// The token currently held "in hand" between a pick and its drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InFlight<T> {
    pub token: T,
    pub source: CellId,
    /// Height in the source stack the token was lifted from.
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(capacity: Option<usize>) -> Cell<u8> {
        Cell::new(CellId::new(ZoneId(0), 'A', 1), capacity)
    }

    #[test]
    fn test_stack_operations() {
        let mut c = cell(None);
        assert!(c.is_empty());
        c.insert(0, 1);
        c.insert(1, 2);
        c.insert(1, 9);
        assert_eq!(c.tokens(), &[1, 9, 2]);
        assert_eq!(c.top(), Some(2));
        assert_eq!(c.remove(1), Some(9));
        assert_eq!(c.remove(5), None);
        assert_eq!(c.height(), 2);
    }

    #[test]
    fn test_capacity() {
        let mut c = cell(Some(1));
        assert!(!c.is_full());
        c.insert(0, 4);
        assert!(c.is_full());
        assert!(!cell(None).is_full());
    }

    #[test]
    fn test_offset() {
        let id = CellId::new(ZoneId(0), 'B', 2);
        assert_eq!(id.offset(1, -1), Some(CellId::new(ZoneId(0), 'C', 1)));
        assert_eq!(id.offset(-1, 3), Some(CellId::new(ZoneId(0), 'A', 5)));
        assert_eq!(id.to_string(), "z0:B2");
    }
}
