//! Search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one robot search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Positions visited (alpha-beta) or iterations run (Monte Carlo).
    pub nodes: u64,

    /// Rollouts performed.
    pub rollouts: u32,

    /// Speculative lines abandoned because the board rejected a move.
    pub illegal_lines: u32,

    /// Alpha-beta cutoffs.
    pub cutoffs: u32,

    /// Deepest ply reached.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn reached(&mut self, depth: usize) {
        let depth = u16::try_from(depth).unwrap_or(u16::MAX);
        self.max_depth = self.max_depth.max(depth);
    }

    #[must_use]
    pub fn nodes_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.nodes as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    #[must_use]
    pub fn rollouts_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            f64::from(self.rollouts) / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
