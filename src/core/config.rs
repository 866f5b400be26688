//! Game and engine configuration.
//!
//! - `InitSpec`: the initialization string `<variant> <seed> <players> [<revision>]`,
//!   parsed once at game creation and again on every replay from scratch.
//! - `EngineConfig`: engine-wide knobs (strictness, digest seed, history
//!   collapse, robot self-checks, animation hints).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;

/// Versioned rule-set selector.
///
/// Old game records replay under the revision they were played with; rule
/// fixes that change outcomes bump the revision instead of silently
/// changing old games.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(pub u32);

impl Revision {
    #[must_use]
    pub const fn at_least(self, other: u32) -> bool {
        self.0 >= other
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed initialization string.
///
/// ```
/// use rust_tabletop::core::InitSpec;
///
/// let spec: InitSpec = "auction 1234 3".parse().unwrap();
/// assert_eq!(spec.players, 3);
/// assert_eq!(spec.revision.0, 0);
/// assert_eq!(spec.to_string(), "auction 1234 3 0");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitSpec {
    pub variant: String,
    pub seed: u64,
    pub players: usize,
    pub revision: Revision,
}

impl InitSpec {
    #[must_use]
    pub fn new(variant: impl Into<String>, seed: u64, players: usize) -> Self {
        Self {
            variant: variant.into(),
            seed,
            players,
            revision: Revision::default(),
        }
    }

    #[must_use]
    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Revision(revision);
        self
    }
}

impl FromStr for InitSpec {
    type Err = EngineError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| EngineError::BadInit {
            text: text.to_string(),
            reason: reason.to_string(),
        };
        let mut tokens = text.split_whitespace();

        let variant = tokens.next().ok_or_else(|| bad("missing variant"))?;
        let seed = tokens
            .next()
            .ok_or_else(|| bad("missing random seed"))?
            .parse::<u64>()
            .map_err(|_| bad("random seed is not an integer"))?;
        let players = tokens
            .next()
            .ok_or_else(|| bad("missing player count"))?
            .parse::<usize>()
            .map_err(|_| bad("player count is not an integer"))?;
        if players == 0 || players > 255 {
            return Err(bad("player count must be 1..=255"));
        }
        let revision = match tokens.next() {
            Some(tok) => Revision(tok.parse::<u32>().map_err(|_| bad("revision is not an integer"))?),
            None => Revision::default(),
        };
        if tokens.next().is_some() {
            return Err(bad("trailing tokens"));
        }

        Ok(Self {
            variant: variant.to_string(),
            seed,
            players,
            revision,
        })
    }
}

impl fmt::Display for InitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.variant, self.seed, self.players, self.revision)
    }
}

/// Default seed of the digest stream. Changing it invalidates every stored digest.
pub const DEFAULT_DIGEST_SEED: u64 = 64_000;

/// Engine-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Panic on protocol violations instead of rejecting them.
    /// Defaults on in debug builds.
    pub strict: bool,

    /// Seed of the fixed pseudorandom stream the digest XORs over.
    pub digest_seed: u64,

    /// Remove history entries whose successor returns to the prior digest.
    pub collapse_history: bool,

    /// Robot boards compare digests after balanced make/unmake sequences.
    pub verify_search_digests: bool,

    /// Record animation hints during execute.
    pub animate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: cfg!(debug_assertions),
            digest_seed: DEFAULT_DIGEST_SEED,
            collapse_history: true,
            verify_search_digests: cfg!(debug_assertions),
            animate: true,
        }
    }
}

impl EngineConfig {
    /// Production settings: reject protocol violations, skip robot self-checks.
    #[must_use]
    pub fn production() -> Self {
        Self {
            strict: false,
            verify_search_digests: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_digest_seed(mut self, seed: u64) -> Self {
        self.digest_seed = seed;
        self
    }

    #[must_use]
    pub fn with_collapse_history(mut self, collapse: bool) -> Self {
        self.collapse_history = collapse;
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_revision() {
        let spec: InitSpec = "route 99 2 1".parse().unwrap();
        assert_eq!(spec.variant, "route");
        assert_eq!(spec.seed, 99);
        assert_eq!(spec.players, 2);
        assert_eq!(spec.revision, Revision(1));
        assert!(spec.revision.at_least(1));
        assert!(!spec.revision.at_least(2));
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<InitSpec>().is_err());
        assert!("jumper".parse::<InitSpec>().is_err());
        assert!("jumper x 2".parse::<InitSpec>().is_err());
        assert!("jumper 1 0".parse::<InitSpec>().is_err());
        assert!("jumper 1 2 3 4".parse::<InitSpec>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let spec = InitSpec::new("jumper", 5, 2).with_revision(3);
        let again: InitSpec = spec.to_string().parse().unwrap();
        assert_eq!(spec, again);
    }

    #[test]
    fn test_engine_config_builders() {
        let config = EngineConfig::default()
            .with_strict(false)
            .with_digest_seed(7)
            .with_collapse_history(false)
            .with_animation(false);
        assert!(!config.strict);
        assert_eq!(config.digest_seed, 7);
        assert!(!config.collapse_history);
        assert!(!config.animate);

        let prod = EngineConfig::production();
        assert!(!prod.strict);
        assert_eq!(prod.digest_seed, DEFAULT_DIGEST_SEED);
    }

    #[test]
    fn test_engine_config_serialization() {
        let config = EngineConfig::production();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
