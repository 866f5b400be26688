//! Token capability trait.

use std::fmt::Debug;
use std::hash::Hash;

/// Anything that sits in a cell stack: a stone, a card, a chip.
pub trait Token: Copy + Eq + Hash + Debug + 'static {
    /// Stable code folded into the digest. Distinct tokens need distinct codes.
    fn digest_code(&self) -> u64;
}
