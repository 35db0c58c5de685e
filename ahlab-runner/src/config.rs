//! Search configuration, loaded from TOML.
//!
//! ```toml
//! [search]
//! min_size = 2
//! max_size = 4
//! min_bets = 10
//! top = 20          # 0 keeps every qualifying entry
//! parallel = true
//!
//! [stake]
//! base_odds = 1.90
//! base_stake = 100.0
//! step = 0.10
//! increment = 10.0
//! max_stake = 200.0
//! fixed_amount = 100.0
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```
//!
//! Any `[[factors]]` tables replace the standard factor library.

use std::path::{Path, PathBuf};

use ahlab_core::factor::{Factor, FactorLibrary, LibraryError};
use ahlab_core::stake::{StakeError, StakePolicy, TieredStake};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LoggingConfig;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid stake settings: {0}")]
    Stake(#[from] StakeError),

    #[error("invalid factor library: {0}")]
    Library(#[from] LibraryError),
}

/// Which combinations to enumerate and how to rank them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub min_size: usize,
    pub max_size: usize,
    /// Results with fewer bets are dropped before ranking.
    pub min_bets: usize,
    /// Keep only the best N entries; `None` keeps all. Written as `top = 0`
    /// in TOML, which has no null.
    #[serde(with = "top_entries")]
    pub top: Option<usize>,
    /// Score partitions on the rayon pool instead of the calling thread.
    pub parallel: bool,
}

mod top_entries {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(top: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(top.unwrap_or(0) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let n = usize::deserialize(d)?;
        Ok((n > 0).then_some(n))
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            min_size: 2,
            max_size: 4,
            min_bets: 10,
            top: Some(20),
            parallel: true,
        }
    }
}

/// Parameters of the standard library's stake factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeSection {
    pub base_odds: f64,
    pub base_stake: f64,
    pub step: f64,
    pub increment: f64,
    pub max_stake: f64,
    pub fixed_amount: f64,
}

impl Default for StakeSection {
    fn default() -> Self {
        let tiered = TieredStake::default();
        Self {
            base_odds: tiered.base_odds,
            base_stake: tiered.base_stake,
            step: tiered.step,
            increment: tiered.increment,
            max_stake: tiered.max_stake,
            fixed_amount: 100.0,
        }
    }
}

impl StakeSection {
    pub fn tiered(&self) -> TieredStake {
        TieredStake {
            base_odds: self.base_odds,
            base_stake: self.base_stake,
            step: self.step,
            increment: self.increment,
            max_stake: self.max_stake,
        }
    }

    pub fn fixed(&self) -> StakePolicy {
        StakePolicy::fixed(self.fixed_amount)
    }
}

/// Full configuration for one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub search: SearchSection,
    pub stake: StakeSection,
    pub logging: LoggingConfig,
    /// Custom factor library; empty means the standard library.
    pub factors: Vec<Factor>,
}

impl SearchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.search;
        if s.min_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_size must be at least 2 (one side and one stake factor), got {}",
                s.min_size
            )));
        }
        if s.max_size < s.min_size {
            return Err(ConfigError::Invalid(format!(
                "max_size {} is below min_size {}",
                s.max_size, s.min_size
            )));
        }
        if s.top == Some(0) {
            return Err(ConfigError::Invalid("top must be at least 1".into()));
        }
        self.stake.tiered().validate()?;
        self.stake.fixed().validate()?;
        Ok(())
    }

    /// The factor library this configuration searches over.
    pub fn library(&self) -> Result<FactorLibrary, ConfigError> {
        let library = if self.factors.is_empty() {
            FactorLibrary::standard(self.stake.tiered(), self.stake.fixed_amount)?
        } else {
            FactorLibrary::from_factors(self.factors.iter().cloned())?
        };
        library.ensure_searchable()?;
        Ok(library)
    }
}
