//! Configuration loading and typed config structures for the Furrow simulation.
//!
//! The canonical configuration lives in `furrow-config.yaml` at the project
//! root. Every field has a default, so an empty file (or no file at all) is
//! a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but a value is unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run defaults (seed, grid, calendar, starting cash).
    #[serde(default)]
    pub world: WorldConfig,

    /// Where the manifest catalog comes from.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Loan and insurance parameters.
    #[serde(default)]
    pub finance: FinanceConfig,

    /// HTTP service binding.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `FURROW_PORT` overrides `observer.port`
    /// - `FURROW_CATALOG` overrides `catalog.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("FURROW_PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
        {
            self.observer.port = port;
        }
        if let Ok(path) = std::env::var("FURROW_CATALOG") {
            self.catalog.path = Some(PathBuf::from(path));
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.grid_size == 0 || self.world.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "world.grid_size must be between 1 and {MAX_GRID_SIZE}, got {}",
                    self.world.grid_size
                ),
            });
        }
        if !self.world.starting_cash.is_finite() {
            return Err(ConfigError::Invalid {
                reason: "world.starting_cash must be finite".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.finance.premium_rate) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "finance.premium_rate must be within [0, 1], got {}",
                    self.finance.premium_rate
                ),
            });
        }
        Ok(())
    }
}

/// Largest accepted grid side.
pub const MAX_GRID_SIZE: usize = 256;

/// Run defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable deployment name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed used when a new run does not specify one.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Side length of each run's grid.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    /// Calendar year of a run's first season.
    #[serde(default = "default_baseline_year")]
    pub baseline_year: i32,

    /// Cash a new run starts with.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: f64,

    /// Region of a run created at startup, if any.
    #[serde(default)]
    pub bootstrap_region: Option<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            grid_size: default_grid_size(),
            baseline_year: default_baseline_year(),
            starting_cash: default_starting_cash(),
            bootstrap_region: None,
        }
    }
}

/// Catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Path to a YAML manifest. `None` uses the built-in catalog.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Loan and insurance parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinanceConfig {
    /// Fraction of the sum insured charged as premium each season.
    #[serde(default = "default_premium_rate")]
    pub premium_rate: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            premium_rate: default_premium_rate(),
        }
    }
}

/// HTTP service binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Furrow".to_owned()
}

const fn default_seed() -> u64 {
    1337
}

const fn default_grid_size() -> usize {
    furrow_world::DEFAULT_GRID_SIZE
}

const fn default_baseline_year() -> i32 {
    2014
}

const fn default_starting_cash() -> f64 {
    10_000.0
}

const fn default_premium_rate() -> f64 {
    0.02
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
