//! Configuration management for ntsb-explorer.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateLimits, DEFAULT_MAX_FINDINGS, DEFAULT_MAX_SUBCATEGORIES};
use crate::error::{Error, Result};
use crate::storage::query::{DEFAULT_MAX_SEARCH_LIMIT, DEFAULT_SEARCH_LIMIT};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "ntsb-explorer";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "accidents.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "NTSB_EXPLORER_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `NTSB_EXPLORER_`, sections split
///    on `__`, e.g. `NTSB_EXPLORER_AGGREGATE__MAX_FINDINGS`)
/// 2. TOML config file at `~/.config/ntsb-explorer/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Findings aggregation configuration.
    pub aggregate: AggregateConfig,
    /// Record search configuration.
    pub search: SearchConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/ntsb-explorer/accidents.db`
    pub database_path: Option<PathBuf>,
}

/// Findings aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Subcategories listed per category.
    pub max_subcategories: usize,
    /// Distinct findings kept in the ranking.
    pub max_findings: usize,
}

/// Record search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size used when none is given.
    pub default_limit: usize,
    /// Largest accepted page size.
    pub max_limit: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            max_subcategories: DEFAULT_MAX_SUBCATEGORIES,
            max_findings: DEFAULT_MAX_FINDINGS,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: DEFAULT_MAX_SEARCH_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.aggregate.max_subcategories == 0 {
            return Err(Error::ConfigValidation {
                message: "max_subcategories must be greater than 0".to_string(),
            });
        }

        if self.aggregate.max_findings == 0 {
            return Err(Error::ConfigValidation {
                message: "max_findings must be greater than 0".to_string(),
            });
        }

        if self.search.default_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "default_limit must be greater than 0".to_string(),
            });
        }

        if self.search.default_limit > self.search.max_limit {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_limit ({}) cannot be greater than max_limit ({})",
                    self.search.default_limit, self.search.max_limit
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Truncation limits for findings aggregation.
    #[must_use]
    pub fn aggregate_limits(&self) -> AggregateLimits {
        AggregateLimits {
            max_subcategories: self.aggregate.max_subcategories,
            max_findings: self.aggregate.max_findings,
        }
    }
}
