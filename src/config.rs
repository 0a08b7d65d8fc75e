//! Player configuration files.
//!
//! A TOML file describes one player; every key is optional and falls back to
//! the [`SearchConfig`] defaults:
//!
//! ```toml
//! depth = 3
//! time_budget_ms = 500
//! refill = { kind = "seeded", seed = 7 }
//!
//! [root_profile]
//! scale = 1.7
//! entries = [
//!     { kind = "candies_removed", tier = "very_high" },
//!     { kind = "distance_from_top", tier = "very_low" },
//! ]
//! ```

use crate::cascade::RefillPolicy;
use crate::error::CrushError;
use crate::heuristics::HeuristicProfile;
use crate::solver::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] CrushError),
}

/// On-disk form of a [`SearchConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub depth: usize,
    pub retain_depth: usize,
    pub pruning: bool,
    pub parallel: bool,
    pub dead_end_penalty: f64,
    pub time_budget_ms: Option<u64>,
    pub refill: RefillPolicy,
    pub root_profile: HeuristicProfile,
    pub deep_profile: HeuristicProfile,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for PlayerConfig {
    fn from(config: &SearchConfig) -> Self {
        PlayerConfig {
            depth: config.depth,
            retain_depth: config.retain_depth,
            pruning: config.pruning,
            parallel: config.parallel,
            dead_end_penalty: config.dead_end_penalty,
            time_budget_ms: config.time_budget.map(|d| d.as_millis() as u64),
            refill: config.refill,
            root_profile: config.root_profile.clone(),
            deep_profile: config.deep_profile.clone(),
        }
    }
}

impl PlayerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Converts to a validated [`SearchConfig`].
    pub fn to_search_config(&self) -> Result<SearchConfig, ConfigError> {
        let config = SearchConfig {
            depth: self.depth,
            retain_depth: self.retain_depth,
            pruning: self.pruning,
            parallel: self.parallel,
            dead_end_penalty: self.dead_end_penalty,
            time_budget: self.time_budget_ms.map(Duration::from_millis),
            refill: self.refill,
            root_profile: self.root_profile.clone(),
            deep_profile: self.deep_profile.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::{HeuristicKind, WeightTier};

    #[test]
    fn test_empty_file_gives_defaults() {
        let parsed = PlayerConfig::from_toml_str("").unwrap();
        assert_eq!(parsed, PlayerConfig::default());
        assert_eq!(parsed.to_search_config().unwrap(), SearchConfig::default());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            depth = 3
            retain_depth = 1
            pruning = false
            parallel = true
            dead_end_penalty = 5.0
            time_budget_ms = 250
            refill = { kind = "diagonal" }

            [deep_profile]
            scale = 1.2
            entries = [{ kind = "chain_reaction", tier = "high" }]
        "#;
        let config = PlayerConfig::from_toml_str(text)
            .unwrap()
            .to_search_config()
            .unwrap();
        assert_eq!(config.depth, 3);
        assert_eq!(config.retain_depth, 1);
        assert!(!config.pruning);
        assert!(config.parallel);
        assert_eq!(config.dead_end_penalty, 5.0);
        assert_eq!(config.time_budget, Some(Duration::from_millis(250)));
        assert_eq!(config.refill, RefillPolicy::Diagonal);
        assert_eq!(config.root_profile, HeuristicProfile::balanced());
        assert_eq!(
            config.deep_profile,
            HeuristicProfile::new(1.2).with(HeuristicKind::ChainReaction, WeightTier::High)
        );
    }

    #[test]
    fn test_seeded_refill() {
        let parsed = PlayerConfig::from_toml_str("refill = { kind = \"seeded\", seed = 42 }").unwrap();
        assert_eq!(parsed.refill, RefillPolicy::Seeded { seed: 42 });
    }

    #[test]
    fn test_zero_depth_is_invalid() {
        let parsed = PlayerConfig::from_toml_str("depth = 0").unwrap();
        assert!(matches!(
            parsed.to_search_config(),
            Err(ConfigError::Invalid(CrushError::Precondition(_)))
        ));
    }

    #[test]
    fn test_bad_scale_is_invalid() {
        let text = r#"
            [root_profile]
            scale = -1.0
            entries = []
        "#;
        let parsed = PlayerConfig::from_toml_str(text).unwrap();
        assert!(matches!(
            parsed.to_search_config(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        assert!(matches!(
            PlayerConfig::from_toml_str("depht = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PlayerConfig::load("/nonexistent/crush/player.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_round_trips_through_search_config() {
        let config = SearchConfig::default()
            .with_depth(2)
            .with_time_budget(Some(Duration::from_millis(1500)));
        let back = PlayerConfig::from(&config).to_search_config().unwrap();
        assert_eq!(back, config);
    }
}
