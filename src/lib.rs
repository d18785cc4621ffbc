//! DOF Loader Library
//!
//! A Rust library for loading the FAA Digital Obstacle File (DOF) into a
//! PostgreSQL/PostGIS obstacle table.
//!
//! This library provides tools for:
//! - Reading both published DOF layouts (delimited CSV and fixed-width DAT)
//! - Applying a stored, versioned column-mapping configuration to either layout
//! - Decomposing compound fields (OAS code/obstacle number, accuracy codes)
//! - Converting DMS coordinates to decimal degrees with strict validation
//! - Quarantining malformed rows without aborting the batch
//! - Loading accepted rows through a staging table swap

pub mod config;
pub mod constants;
pub mod pipeline;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod coordinates;
        pub mod decomposer;
        pub mod dof_reader;
        pub mod format_config;
        pub mod obstacle_types;
        pub mod record_processor;
        pub mod staging_loader;
    }
    pub mod adapters {
        pub mod database;
        pub mod reference_store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{FileType, ObstacleRecord, QuarantineEntry, QuarantineReason, RawRow};
pub use config::Config;
pub use pipeline::{IngestionPipeline, RunSummary};

/// Result type alias for the DOF loader
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types for a DOF ingestion run
///
/// Per-row problems never surface here; they are carried by
/// [`app::models::RowError`] and end up in the quarantine output.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading or writing error
    #[error("CSV error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Configuration error (application config or stored format configuration)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// No stored format configuration for the file type
    #[error("Format configuration not found for file type '{file_type}'")]
    FormatNotFound { file_type: String },

    /// Obstacle type names missing from the reference table
    #[error("Unknown obstacle types (missing from reference table): {}", names.join(", "))]
    UnknownObstacleTypes { names: Vec<String> },

    /// Staging load failed
    #[error("Load failed at stage '{stage}': {message}")]
    Load { stage: String, message: String },

    /// Database query error outside the load stages
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// Source file has an extension that maps to no DOF layout
    #[error("Unsupported file type '{extension}' (expected .csv, .dat or .txt)")]
    UnsupportedFileType { extension: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a format-not-found error
    pub fn format_not_found(file_type: impl Into<String>) -> Self {
        Self::FormatNotFound {
            file_type: file_type.into(),
        }
    }

    /// Create an unknown obstacle types error
    pub fn unknown_obstacle_types(names: Vec<String>) -> Self {
        Self::UnknownObstacleTypes { names }
    }

    /// Create a load error for the given stage
    pub fn load(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a database error with context
    pub fn database(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Create an unsupported file type error
    pub fn unsupported_file_type(extension: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            extension: extension.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Name of the run stage this error aborted
    pub fn stage(&self) -> &str {
        match self {
            Self::Io { .. }
            | Self::CsvParsing { .. }
            | Self::FileNotFound { .. }
            | Self::UnsupportedFileType { .. } => "read source",
            Self::Configuration { .. } | Self::FormatNotFound { .. } => "resolve configuration",
            Self::UnknownObstacleTypes { .. } => "resolve obstacle types",
            Self::Load { .. } => "load",
            Self::Database { .. } => "reference lookup",
            Self::ProcessingInterrupted { .. } => "interrupted",
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV processing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            message: "Query failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid JSON: {}", error),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid TOML: {}", error),
        }
    }
}
