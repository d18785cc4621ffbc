//! Application constants for the DOF loader
//!
//! This module contains default values, canonical field names and the
//! declared validation field sets used throughout the DOF loader.

// =============================================================================
// Source File Layout
// =============================================================================

/// Header lines preceding obstacle data in the fixed-width DAT publication
pub const DAT_HEADER_LINES: usize = 4;

/// Default field delimiter for the delimited (CSV) publication
pub const DEFAULT_DELIMITER: u8 = b',';

/// File extensions mapped to the delimited layout
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv"];

/// File extensions mapped to the fixed-width layout
pub const FIXED_WIDTH_EXTENSIONS: &[&str] = &["dat", "txt"];

// =============================================================================
// Canonical Field Names
// =============================================================================

/// Canonical field names of an obstacle row after renaming and decomposition
pub mod fields {
    pub const OAS_CODE: &str = "oas_code";
    pub const OBST_NUMBER: &str = "obst_number";
    pub const VERIF_STATUS_CODE: &str = "verif_status_code";
    pub const LIGHTING_CODE: &str = "lighting_code";
    pub const MARKING_CODE: &str = "marking_code";
    pub const HOR_ACC_CODE: &str = "hor_acc_code";
    pub const VERT_ACC_CODE: &str = "vert_acc_code";
    pub const CITY: &str = "city";
    pub const QUANTITY: &str = "quantity";
    pub const AGL: &str = "agl";
    pub const AMSL: &str = "amsl";
    pub const FAA_STUDY_NUMBER: &str = "faa_study_number";
    pub const ACTION: &str = "action";
    pub const JULIAN_DATE: &str = "julian_date";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";

    /// Obstacle type column of the fixed-width layout
    pub const OBST_TYPE: &str = "obst_type";

    /// Coordinate source columns of the fixed-width layout
    pub const LAT_SRC: &str = "lat_src";
    pub const LON_SRC: &str = "lon_src";

    /// Fields that must come out of the mapping for every format
    pub const MAPPED_FIELDS: &[&str] = &[
        VERIF_STATUS_CODE,
        LIGHTING_CODE,
        MARKING_CODE,
        CITY,
        AGL,
        ACTION,
    ];

    /// Fields the fixed-width layout carries already decomposed
    pub const FIXED_WIDTH_DECOMPOSED: &[&str] =
        &[OAS_CODE, OBST_NUMBER, HOR_ACC_CODE, VERT_ACC_CODE];
}

// =============================================================================
// Validation Field Sets
// =============================================================================

/// Fields that must be non-empty in every accepted row
pub const REQUIRED_FIELDS: &[&str] = &[
    fields::OAS_CODE,
    fields::OBST_NUMBER,
    fields::VERIF_STATUS_CODE,
    fields::LIGHTING_CODE,
    fields::MARKING_CODE,
    fields::CITY,
    fields::AGL,
    fields::ACTION,
];

/// Fields that must coerce to a number when present
pub const NUMERIC_FIELDS: &[&str] = &[fields::AGL, fields::AMSL, fields::QUANTITY];

/// Maximum character length of the text columns of the obstacle table
pub const TEXT_FIELD_WIDTHS: &[(&str, usize)] = &[
    (fields::OAS_CODE, 2),
    (fields::OBST_NUMBER, 6),
    (fields::VERIF_STATUS_CODE, 1),
    (fields::LIGHTING_CODE, 1),
    (fields::MARKING_CODE, 1),
    (fields::CITY, 20),
    (fields::FAA_STUDY_NUMBER, 14),
    (fields::ACTION, 1),
    (fields::JULIAN_DATE, 7),
];

// =============================================================================
// Database Defaults
// =============================================================================

/// Default schema holding the obstacle and reference tables
pub const DEFAULT_SCHEMA: &str = "dof";

/// Default permanent obstacle table
pub const DEFAULT_TARGET_TABLE: &str = "obstacle";

/// Suffix appended to the target table name for the run's staging table
pub const STAGING_SUFFIX: &str = "_tmp";

/// Spatial reference of every obstacle location (WGS84)
pub const SRID_WGS84: i32 = 4326;

/// Rows per multi-row INSERT into the staging table
///
/// Each row binds 17 parameters; PostgreSQL allows 65535 per statement.
pub const STAGING_INSERT_CHUNK: usize = 2000;

/// Default connection pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

// =============================================================================
// Quarantine Output
// =============================================================================

/// File name prefix of the per-run quarantine file
pub const QUARANTINE_FILE_PREFIX: &str = "quarantine";

/// Timestamp format used to namespace quarantine files by run
pub const QUARANTINE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when no verbosity flag is given
pub const DEFAULT_LOG_LEVEL: &str = "warn";
