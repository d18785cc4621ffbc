//! Data models for DOF processing
//!
//! This module contains the core data structures that flow through an
//! ingestion run: raw rows as read from a source file, the normalized
//! obstacle record handed to the loader, and the quarantine entries that
//! replace rows which fail any per-row check.

use crate::constants::{DELIMITED_EXTENSIONS, FIXED_WIDTH_EXTENSIONS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// Source File Types
// =============================================================================

/// Published DOF layouts, keyed by the tag used in the configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Delimited CSV publication
    Csv,
    /// Legacy fixed-width positional publication
    Dat,
}

impl FileType {
    /// Configuration store tag for this layout
    pub fn tag(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Dat => "dat",
        }
    }

    /// Determine the layout from a source file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(FileType::Csv)
        } else if FIXED_WIDTH_EXTENSIONS.contains(&extension.as_str()) {
            Ok(FileType::Dat)
        } else {
            Err(Error::unsupported_file_type(extension))
        }
    }

    /// True for the fixed-width layout
    pub fn is_fixed_width(&self) -> bool {
        matches!(self, FileType::Dat)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "dat" => Ok(FileType::Dat),
            other => Err(Error::unsupported_file_type(other)),
        }
    }
}

// =============================================================================
// Raw Rows
// =============================================================================

/// Ordered mapping of field name to raw string value for one source line
///
/// Produced by a format reader before any decomposition. Field order is the
/// order in which the reader emitted the columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    /// 1-based line (or record) number in the source file
    pub line: usize,
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: Vec::new(),
        }
    }

    /// Build a row from name/value pairs
    pub fn from_pairs<K, V>(line: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new(line);
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check if a field exists
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Set a field, replacing the value in place or appending a new field
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.fields.iter().position(|(field, _)| field == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Rename a field, keeping its position; returns false when absent
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if !self.contains(from) {
            return false;
        }
        if from != to {
            // A rename onto an existing name replaces that field
            self.fields.retain(|(field, _)| field != to);
        }
        if let Some(entry) = self.fields.iter_mut().find(|(field, _)| field == from) {
            entry.0 = to.to_string();
        }
        true
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Name/value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A row moving through the pipeline
///
/// `source` is the row exactly as the reader produced it and is what the
/// quarantine output records; `fields` is the working copy that gets renamed,
/// decomposed and coordinate-converted. Converted coordinates are held as
/// decimal degrees rather than written back into `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingRow {
    pub source: RawRow,
    pub fields: RawRow,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WorkingRow {
    /// Start processing a freshly read row
    pub fn new(source: RawRow) -> Self {
        let fields = source.clone();
        Self {
            source,
            fields,
            latitude: None,
            longitude: None,
        }
    }

    pub fn line(&self) -> usize {
        self.source.line
    }

    /// Convert into a quarantine entry for the given failure
    pub fn quarantine(self, error: &RowError) -> QuarantineEntry {
        QuarantineEntry::new(self.source, error)
    }
}

// =============================================================================
// Per-Row Errors
// =============================================================================

/// DMS or decimal coordinate failed hemisphere, format or range checks
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("empty coordinate value")]
    Empty,

    #[error("invalid hemisphere '{hemisphere}' in '{value}' (expected N, S, E or W)")]
    InvalidHemisphere { value: String, hemisphere: char },

    #[error("malformed coordinate '{value}' (expected D-M-S followed by hemisphere)")]
    Malformed { value: String },

    #[error("{component} out of range in '{value}'")]
    OutOfRange {
        value: String,
        component: &'static str,
    },

    #[error("'{value}' exceeds the maximum of {max_degree} degrees")]
    ExceedsMaximum { value: String, max_degree: u16 },
}

/// Compound field or fixed-width token could not be decomposed
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("invalid identifier '{value}' (expected exactly one '-' separator)")]
    InvalidIdentifier { value: String },

    #[error("invalid accuracy '{value}' (expected 2 characters: digit then vertical code)")]
    InvalidAccuracy { value: String },

    #[error("unparsable value '{value}' for field '{field}'")]
    UnparsableField { field: String, value: String },

    #[error("malformed record: {message}")]
    MalformedRecord { message: String },
}

/// Any failure that quarantines a single row
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("coordinate field '{field}': {source}")]
    Coordinate {
        field: String,
        #[source]
        source: CoordinateError,
    },

    #[error("missing required value for field '{field}'")]
    MissingRequired { field: String },

    #[error("non-numeric value '{value}' for field '{field}'")]
    NonNumeric { field: String, value: String },
}

impl RowError {
    pub fn coordinate(field: impl Into<String>, source: CoordinateError) -> Self {
        Self::Coordinate {
            field: field.into(),
            source,
        }
    }

    pub fn missing_required(field: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
        }
    }

    pub fn non_numeric(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NonNumeric {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Quarantine reason tag for this failure class
    pub fn reason(&self) -> QuarantineReason {
        match self {
            RowError::Format(FormatError::InvalidIdentifier { .. }) => {
                QuarantineReason::InvalidIdentifier
            }
            RowError::Format(FormatError::InvalidAccuracy { .. }) => {
                QuarantineReason::InvalidAccuracy
            }
            RowError::Format(FormatError::UnparsableField { .. }) => {
                QuarantineReason::UnparsableField
            }
            RowError::Format(FormatError::MalformedRecord { .. }) => {
                QuarantineReason::MalformedRecord
            }
            RowError::Coordinate { .. } => QuarantineReason::CoordinateError,
            RowError::MissingRequired { .. } => QuarantineReason::MissingRequiredValue,
            RowError::NonNumeric { .. } => QuarantineReason::NonNumericValue,
        }
    }
}

// =============================================================================
// Quarantine
// =============================================================================

/// Failure reason tag attached to a quarantined row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuarantineReason {
    InvalidAccuracy,
    MissingRequiredValue,
    NonNumericValue,
    CoordinateError,
    InvalidIdentifier,
    UnparsableField,
    MalformedRecord,
}

impl QuarantineReason {
    /// Label written to the quarantine file's reason column
    pub fn as_str(&self) -> &'static str {
        match self {
            QuarantineReason::InvalidAccuracy => "invalid accuracy format",
            QuarantineReason::MissingRequiredValue => "missing required value",
            QuarantineReason::NonNumericValue => "non-numeric value",
            QuarantineReason::CoordinateError => "coordinate error",
            QuarantineReason::InvalidIdentifier => "invalid identifier format",
            QuarantineReason::UnparsableField => "unparsable field",
            QuarantineReason::MalformedRecord => "malformed record",
        }
    }
}

impl fmt::Display for QuarantineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected source row and the reason it was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct QuarantineEntry {
    /// Row exactly as read from the source file
    pub row: RawRow,
    pub reason: QuarantineReason,
    /// Human-readable description of the specific failure
    pub detail: String,
}

impl QuarantineEntry {
    pub fn new(row: RawRow, error: &RowError) -> Self {
        Self {
            row,
            reason: error.reason(),
            detail: error.to_string(),
        }
    }
}

// =============================================================================
// Obstacle Record
// =============================================================================

/// Normalized obstacle, one per accepted source row
///
/// Constructed once by the record builder and consumed by the staging
/// loader. Audit columns (insert user/timestamp) are filled by the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleRecord {
    /// OAS (region) code, 2 characters
    pub oas_code: String,

    /// Obstacle number within the OAS region
    pub obst_number: String,

    pub verif_status_code: String,

    /// Primary key in the obstacle type reference table
    pub type_id: i16,

    pub lighting_code: String,
    pub marking_code: String,
    pub hor_acc_code: i16,
    pub vert_acc_code: char,
    pub city: String,
    pub quantity: Option<i16>,

    /// Height above ground level (feet)
    pub agl: f64,

    /// Height above mean sea level (feet)
    pub amsl: Option<f64>,

    pub faa_study_number: Option<String>,
    pub action: String,
    pub julian_date: Option<String>,

    /// WGS84 decimal degrees
    pub latitude: f64,

    /// WGS84 decimal degrees
    pub longitude: f64,
}

impl ObstacleRecord {
    /// Natural key of the obstacle table
    pub fn key(&self) -> (&str, &str) {
        (&self.oas_code, &self.obst_number)
    }
}
