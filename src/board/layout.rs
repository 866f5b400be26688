//! Initial board layout builder.

use rustc_hash::FxHashMap;

use crate::core::{EngineError, EngineResult, GameRng};

use super::cell::{Cell, CellId};
use super::token::Token;

/// Collects cells and their starting tokens while a board is built.
///
/// Cell order is the order cells are added; the digest walks cells in that
/// order, so games must add them deterministically.
#[derive(Debug)]
pub struct Layout<T> {
    pub(crate) cells: Vec<Cell<T>>,
    pub(crate) index: FxHashMap<CellId, usize>,
    rng: GameRng,
}

impl<T: Token> Layout<T> {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            cells: Vec::new(),
            index: FxHashMap::default(),
            rng: GameRng::new(seed),
        }
    }

    /// Add an unbounded cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell was already added.
    pub fn add_cell(&mut self, id: CellId) -> &mut Self {
        self.add(id, None)
    }

    /// Add a cell that holds at most `capacity` tokens.
    pub fn add_bounded_cell(&mut self, id: CellId, capacity: usize) -> &mut Self {
        self.add(id, Some(capacity))
    }

    fn add(&mut self, id: CellId, capacity: Option<usize>) -> &mut Self {
        assert!(!self.index.contains_key(&id), "duplicate cell {id}");
        self.index.insert(id, self.cells.len());
        self.cells.push(Cell::new(id, capacity));
        self
    }

    /// Put a token on top of a cell.
    pub fn place(&mut self, id: CellId, token: T) -> EngineResult<()> {
        let idx = *self.index.get(&id).ok_or(EngineError::UnknownCell(id))?;
        let cell = &mut self.cells[idx];
        if cell.is_full() {
            return Err(EngineError::CellFull(id));
        }
        let height = cell.height();
        cell.insert(height, token);
        Ok(())
    }

    /// RNG seeded from the init string, for dealing and shuffling.
    pub fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.index.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ZoneId;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    struct Chip(u8);

    impl Token for Chip {
        fn digest_code(&self) -> u64 {
            u64::from(self.0)
        }
    }

    const A1: CellId = CellId::new(ZoneId(0), 'A', 1);
    const B1: CellId = CellId::new(ZoneId(0), 'B', 1);

    #[test]
    fn test_place_and_capacity() {
        let mut layout = Layout::<Chip>::new(1);
        layout.add_cell(A1).add_bounded_cell(B1, 1);
        layout.place(A1, Chip(1)).unwrap();
        layout.place(A1, Chip(2)).unwrap();
        layout.place(B1, Chip(3)).unwrap();
        assert_eq!(layout.place(B1, Chip(4)), Err(EngineError::CellFull(B1)));
        assert_eq!(layout.cells[0].tokens(), &[Chip(1), Chip(2)]);
    }

    #[test]
    fn test_unknown_cell() {
        let mut layout = Layout::<Chip>::new(1);
        assert_eq!(layout.place(A1, Chip(1)), Err(EngineError::UnknownCell(A1)));
    }

    #[test]
    #[should_panic(expected = "duplicate cell")]
    fn test_duplicate_cell_panics() {
        let mut layout = Layout::<Chip>::new(1);
        layout.add_cell(A1).add_cell(A1);
    }
}
