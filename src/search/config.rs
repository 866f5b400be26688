//! Robot search configuration.

use serde::{Deserialize, Serialize};

/// Search configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Alpha-beta search depth in plies.
    pub depth: u32,

    /// Monte Carlo iterations (one rollout each).
    pub iterations: u32,

    /// Maximum plies per rollout before falling back to static evaluation.
    pub rollout_depth: u32,

    /// UCB1 exploration constant (default: sqrt(2)).
    pub exploration_constant: f64,

    /// Random seed for rollouts and re-randomization.
    /// Same seed produces the same search.
    pub seed: u64,

    /// Re-randomize concealed cells before every rollout.
    pub rerandomize: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            iterations: 400,
            rollout_depth: 60,
            exploration_constant: std::f64::consts::SQRT_2,
            seed: 42,
            rerandomize: true,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_rollout_depth(mut self, depth: u32) -> Self {
        self.rollout_depth = depth;
        self
    }

    #[must_use]
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_rerandomize(mut self, rerandomize: bool) -> Self {
        self.rerandomize = rerandomize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert!((config.exploration_constant - std::f64::consts::SQRT_2).abs() < 0.001);
        assert_eq!(config.depth, 3);
        assert_eq!(config.seed, 42);
        assert!(config.rerandomize);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_exploration(2.0)
            .with_seed(123)
            .with_depth(5)
            .with_iterations(10)
            .with_rollout_depth(8)
            .with_rerandomize(false);

        assert_eq!(config.exploration_constant, 2.0);
        assert_eq!(config.seed, 123);
        assert_eq!(config.depth, 5);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.rollout_depth, 8);
        assert!(!config.rerandomize);
    }

    #[test]
    fn test_serialization() {
        let config = SearchConfig::default().with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
