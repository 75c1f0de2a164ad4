//! Configuration system for depprof.
//!
//! Load profiling configuration from TOML or YAML files to control the
//! filter policy, set assignment, and scheduling options without code
//! changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use depprof_config::{ProfileConfig, ProfileMode, SignatureFlavor};
//!
//! let config = ProfileConfig::from_toml_str(r#"
//!     mode = "signature"
//!     early_termination = true
//!
//!     [signature]
//!     bits = 2048
//!     flavor = "hybrid"
//!
//!     [assignment]
//!     strategy = "uniform"
//!     max_set_size = 8
//! "#).unwrap();
//!
//! assert_eq!(config.mode, ProfileMode::Signature);
//! assert_eq!(config.signature.bits, 2048);
//! assert_eq!(config.signature.flavor, SignatureFlavor::Hybrid);
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use depprof_config::ProfileConfig;
//!
//! let config = ProfileConfig::load("profile.toml").unwrap_or_default();
//! // Proceeds with defaults if the file doesn't exist
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which filter family the scheduler allocates per profile set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// Inline signatures sized by [`SignatureConfig`].
    #[default]
    Signature,
    /// Exact sets; the accuracy oracle, highest overhead.
    Perfect,
    /// Min/max ranges only.
    Range,
    /// The process-wide shared hash table.
    HashTable,
}

/// Which signature configuration the factory builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureFlavor {
    /// Cheapest hashing; flat arrays for large budgets.
    Fast,
    /// Multiplicative hashing; banked above 512 bits.
    #[default]
    Accurate,
    /// Range gate in front of the banked configuration.
    Hybrid,
    /// Banked with struct-size-aware hashing where a hint is available.
    StructAware,
}

/// Signature sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SignatureConfig {
    /// Requested bit budget per filter instance.
    pub bits: u32,
    pub flavor: SignatureFlavor,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        SignatureConfig {
            bits: 1024,
            flavor: SignatureFlavor::default(),
        }
    }
}

/// Query-to-set assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct AssignmentConfig {
    pub strategy: AssignStrategy,
    /// Producer cap per set under the uniform strategy; -1 means one global
    /// set for the whole region.
    pub max_set_size: i32,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        AssignmentConfig {
            strategy: AssignStrategy::default(),
            max_set_size: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignStrategy {
    #[default]
    Uniform,
    Linear,
}

/// Main profiling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ProfileConfig {
    pub mode: ProfileMode,

    pub signature: SignatureConfig,

    /// Stop checking for a dependence in a region once it is confirmed.
    pub early_termination: bool,

    pub assignment: AssignmentConfig,

    /// Process-wide hash table size in bytes (hash-table mode).
    pub table_size: u32,

    /// Wrap the named query's filter in the mismatch-logging decorator.
    pub dump_refid: Option<u64>,

    /// Cap on the number of queries scheduled per region.
    pub limit: Option<usize>,

    /// Collect filter populations on region exits.
    pub population_count: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            mode: ProfileMode::default(),
            signature: SignatureConfig::default(),
            early_termination: false,
            assignment: AssignmentConfig::default(),
            table_size: 50_000,
            dump_refid: None,
            limit: None,
            population_count: true,
        }
    }
}

impl ProfileConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Validates cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Hybrid and struct-aware signatures need a banked configuration, which
    /// starts above 512 bits; a zero table size cannot hold any bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ProfileMode::Signature
            && self.signature.bits <= 512
            && matches!(
                self.signature.flavor,
                SignatureFlavor::Hybrid | SignatureFlavor::StructAware
            )
        {
            return Err(ConfigError::Invalid(format!(
                "{:?} signatures need more than 512 bits, got {}",
                self.signature.flavor, self.signature.bits
            )));
        }
        if self.mode == ProfileMode::HashTable && self.table_size == 0 {
            return Err(ConfigError::Invalid(
                "hash-table mode needs a nonzero table size".to_string(),
            ));
        }
        if self.assignment.max_set_size == 0 || self.assignment.max_set_size < -1 {
            return Err(ConfigError::Invalid(format!(
                "max_set_size must be -1 or positive, got {}",
                self.assignment.max_set_size
            )));
        }
        Ok(())
    }
}
