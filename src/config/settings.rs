//! TOML-based configuration for schemagraph.
//!
//! Supports a config file (schemagraph.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.local]
//! driver = "sqlite"
//! path = "${HOME}/data/app.db"
//!
//! [connections.fixture]
//! driver = "snapshot"
//! path = "./fixtures/schema.json"
//!
//! [aggregation]
//! concurrency = 8
//! fetch_timeout_ms = 5000
//! exclude_tables = ["^sqlite_", "_backup$"]
//!
//! [layout]
//! node_width = 250
//! base_height = 40
//! row_height = 28
//! rank_gap = 120
//! node_gap = 40
//! max_ordering_passes = 24
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::connection::Driver;
use crate::aggregate::{AggregatorConfig, DEFAULT_CONCURRENCY};
use crate::layout::LayoutConfig;
use crate::metadata::{MetadataError, MetadataProvider};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to open metadata source: {0}")]
    Metadata(#[from] MetadataError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named metadata sources.
    pub connections: HashMap<String, ConnectionSettings>,

    /// Aggregation tuning.
    pub aggregation: AggregationSettings,

    /// Node geometry and layer spacing.
    pub layout: LayoutConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Metadata driver (sqlite, snapshot).
    pub driver: String,

    /// Database or snapshot file (supports ${ENV_VAR} expansion).
    pub path: String,
}

impl ConnectionSettings {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Sqlite.as_str().to_string(),
            path: path.into(),
        }
    }

    pub fn snapshot(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Snapshot.as_str().to_string(),
            path: path.into(),
        }
    }

    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Get the path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.path).map(PathBuf::from)
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Tables fetched at once.
    pub concurrency: usize,

    /// Per-call timeout. Absent means no limit.
    pub fetch_timeout_ms: Option<u64>,

    /// Regular expressions matched against table names.
    pub exclude_tables: Vec<String>,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout_ms: None,
            exclude_tables: Vec::new(),
        }
    }
}

impl AggregationSettings {
    /// Compile into an aggregator config.
    pub fn to_config(&self) -> Result<AggregatorConfig, SettingsError> {
        if self.concurrency == 0 {
            return Err(SettingsError::InvalidConfig(
                "aggregation.concurrency must be at least 1".to_string(),
            ));
        }

        let mut config = AggregatorConfig::default().with_concurrency(self.concurrency);
        if let Some(ms) = self.fetch_timeout_ms {
            config = config.with_fetch_timeout(Duration::from_millis(ms));
        }
        for pattern in &self.exclude_tables {
            let regex = Regex::new(pattern).map_err(|source| SettingsError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            config = config.with_exclude(regex);
        }
        Ok(config)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMAGRAPH_CONFIG`
    /// 2. `./schemagraph.toml`
    /// 3. `~/.config/schemagraph/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCHEMAGRAPH_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("schemagraph.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schemagraph").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Open the metadata provider behind a named connection.
    pub fn provider_for(&self, name: &str) -> Result<Arc<dyn MetadataProvider>, SettingsError> {
        let connection = self.get_connection(name)?;
        let driver = connection.driver_type()?;
        let path = connection.resolved_path()?;
        Ok(driver.open(name, &path)?)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated variable reference `${{{}`",
                    name
                )));
            }
            name
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
