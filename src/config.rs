//! Monitor configuration.
//!
//! Settings are read from a YAML file and may be overridden through
//! `HAWATCH_` environment variables, with `__` between nested keys
//! (`HAWATCH_TIMEOUT=10`, `HAWATCH_LOADBALANCERS__EDGE__NAME=Edge`).
//!
//! ```yaml
//! hide_no_check: false
//! timeout: 5
//! interval: 5
//! schema: tolerant
//! high_sessions_threshold: 150
//! loadbalancers:
//!   edge:
//!     name: Edge
//!     urls:
//!       - http://lb1:8080/stats;csv
//!       - http://lb2:8080/stats;csv
//!     options:
//!       ignore_high_sessions: true
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use hawatch_feeds::{
    ClusterOptions, ColumnSpec, DecodeError, DuplicateDetection, FeedError, FeedSource, Schema,
    SchemaMode,
};

use crate::data::AggregateOptions;

/// Errors loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("No loadbalancers configured")]
    NoClusters,

    #[error("Loadbalancer '{0}' has no urls")]
    EmptyUrls(String),

    #[error("'{0}' must be greater than zero")]
    Zero(&'static str),

    #[error("'strict_columns' requires 'schema: strict'")]
    ColumnsWithoutStrict,

    #[error("Invalid strict_columns: {0}")]
    Schema(#[from] DecodeError),

    #[error(transparent)]
    Client(#[from] FeedError),
}

/// One configured cluster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterSettings {
    /// Display name; defaults to the map key.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub options: ClusterOptions,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Suppress "no check" advisories.
    #[serde(default, alias = "hidenocheck")]
    pub hide_no_check: bool,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_seconds")]
    pub timeout: u64,

    /// Delay between poll cycles, in seconds.
    #[serde(default = "default_seconds")]
    pub interval: u64,

    #[serde(default)]
    pub schema: SchemaMode,

    /// Defaults to the predicate paired with `schema`.
    #[serde(default)]
    pub duplicate_detection: Option<DuplicateDetection>,

    /// Current sessions above which an `UP` server gets an advisory.
    pub high_sessions_threshold: i64,

    /// Column layout replacing the built-in strict schema.
    #[serde(default)]
    pub strict_columns: Option<Vec<ColumnSpec>>,

    #[serde(default)]
    pub loadbalancers: BTreeMap<String, ClusterSettings>,
}

const ENV_PREFIX: &str = "HAWATCH";

fn default_seconds() -> u64 {
    5
}

impl Settings {
    /// Load settings from a YAML file plus `HAWATCH_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load settings with overrides taken from `env` instead of the process
    /// environment when given.
    fn load_with_env(
        path: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML string, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that cannot run a poll cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loadbalancers.is_empty() {
            return Err(ConfigError::NoClusters);
        }
        if let Some((key, _)) = self.loadbalancers.iter().find(|(_, c)| c.urls.is_empty()) {
            return Err(ConfigError::EmptyUrls(key.clone()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Zero("timeout"));
        }
        if self.interval == 0 {
            return Err(ConfigError::Zero("interval"));
        }
        self.schema()?;
        Ok(())
    }

    /// The decoding schema these settings select.
    pub fn schema(&self) -> Result<Schema, ConfigError> {
        match (&self.strict_columns, self.schema) {
            (None, mode) => Ok(Schema::for_mode(mode)),
            (Some(columns), SchemaMode::Strict) => Ok(Schema::custom_strict(columns)?),
            (Some(_), SchemaMode::Tolerant) => Err(ConfigError::ColumnsWithoutStrict),
        }
    }

    pub fn detection(&self) -> DuplicateDetection {
        self.duplicate_detection
            .unwrap_or_else(|| DuplicateDetection::for_mode(self.schema))
    }

    /// Configured clusters as feed sources, ordered by key.
    pub fn sources(&self) -> Vec<FeedSource> {
        self.loadbalancers
            .iter()
            .map(|(key, cluster)| {
                FeedSource::new(key.clone(), cluster.urls.clone())
                    .with_display_name(cluster.name.clone().unwrap_or_else(|| key.clone()))
                    .with_options(cluster.options.clone())
            })
            .collect()
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            hide_no_check: self.hide_no_check,
            high_sessions_threshold: self.high_sessions_threshold,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
