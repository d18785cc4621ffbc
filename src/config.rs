//! Configuration management and validation.
//!
//! Provides configuration structures for database access, ingestion
//! settings and logging. Configuration is layered: built-in defaults, then
//! an optional TOML file, then environment variables, then CLI overrides
//! (applied by the command layer).

use crate::app::adapters::database::quote_identifier;
use crate::constants::{
    DAT_HEADER_LINES, DEFAULT_DELIMITER, DEFAULT_LOG_LEVEL, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_SCHEMA, DEFAULT_TARGET_TABLE,
};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable for the database URL (preferred)
pub const ENV_DATABASE_URL: &str = "DOF_DATABASE_URL";

/// Fallback environment variable for the database URL
pub const ENV_DATABASE_URL_FALLBACK: &str = "DATABASE_URL";

/// Environment variable for the DOF schema
pub const ENV_SCHEMA: &str = "DOF_DB_SCHEMA";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: Option<String>,

    /// Schema holding the obstacle, reference and configuration tables
    pub schema: String,

    /// Connection pool size; statements are still issued one at a time
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            schema: DEFAULT_SCHEMA.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Permanent obstacle table (in `database.schema`)
    pub target_table: String,

    /// Field delimiter of the CSV publication
    pub delimiter: char,

    /// Header lines to skip in the fixed-width publication
    pub header_lines: usize,

    /// Directory for per-run quarantine files
    pub quarantine_dir: PathBuf,

    /// Write quarantined rows to a file
    pub write_quarantine: bool,

    /// Date stamped into `valid_from` of loaded rows (default: run date)
    pub valid_from: Option<NaiveDate>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            target_table: DEFAULT_TARGET_TABLE.to_string(),
            delimiter: DEFAULT_DELIMITER as char,
            header_lines: DAT_HEADER_LINES,
            quarantine_dir: PathBuf::from("."),
            write_quarantine: true,
            valid_from: None,
        }
    }
}

impl IngestConfig {
    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::configuration(format!(
                "Delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Default configuration file location (`<config dir>/dof-loader/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("dof-loader").join("config.toml"))
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read config file {}", path.display()), e))?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Load defaults, then the config file (if any), then environment overrides
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_DATABASE_URL).or_else(|| lookup(ENV_DATABASE_URL_FALLBACK)) {
            self.database.url = Some(url);
        }
        if let Some(schema) = lookup(ENV_SCHEMA) {
            self.database.schema = schema;
        }
    }

    /// Validate settings shared by every command
    pub fn validate(&self) -> Result<()> {
        quote_identifier(&self.database.schema)?;
        quote_identifier(&self.ingest.target_table)?;
        self.ingest.delimiter_byte()?;

        if self.database.max_connections == 0 {
            return Err(Error::configuration("database.max_connections must be at least 1"));
        }
        Ok(())
    }

    /// Validate settings needed to reach the database
    pub fn validate_database(&self) -> Result<()> {
        match self.database.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(Error::configuration(format!(
                "Database URL not set (use --database-url, {} or {})",
                ENV_DATABASE_URL, ENV_DATABASE_URL_FALLBACK
            ))),
        }
    }
}
