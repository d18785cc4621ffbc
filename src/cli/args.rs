//! Command-line argument definitions for the DOF loader
//!
//! This module defines the complete CLI interface using the clap derive API.
//! Flags given here override the configuration file and the environment.

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the DOF loader
///
/// Loads the FAA Digital Obstacle File (CSV or fixed-width DAT) into a
/// PostGIS obstacle table, quarantining rows that fail validation.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dof-loader",
    version,
    about = "Load the FAA Digital Obstacle File into a PostGIS obstacle table",
    long_about = "Reads the FAA Digital Obstacle File in either published layout (delimited CSV \
                  or fixed-width DAT), applies the stored column-mapping configuration, converts \
                  DMS coordinates to decimal degrees and loads the accepted rows through a \
                  staging table. Rows that fail validation are written to a quarantine file."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/dof-loader/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Validate a DOF file and load the accepted rows
    Load(LoadArgs),
    /// Validate a DOF file and write the quarantine file without loading
    Validate(ValidateArgs),
    /// List the obstacle types used in a DOF file
    Types(TypesArgs),
}

/// Database connection overrides
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct DatabaseArgs {
    /// PostgreSQL connection URL (overrides DOF_DATABASE_URL and DATABASE_URL)
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Schema holding the obstacle and reference tables
    #[arg(long = "schema", value_name = "NAME")]
    pub schema: Option<String>,
}

/// File-backed reference data, used instead of the database
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct OfflineArgs {
    /// JSON document of format settings keyed by file type
    #[arg(long = "settings", value_name = "FILE", requires = "obstacle_types")]
    pub settings: Option<PathBuf>,

    /// Semicolon-delimited `type;id` list of obstacle types
    #[arg(long = "obstacle-types", value_name = "FILE", requires = "settings")]
    pub obstacle_types: Option<PathBuf>,
}

impl OfflineArgs {
    /// Both reference files, when given
    pub fn files(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.settings.as_ref().zip(self.obstacle_types.as_ref())
    }
}

/// Source reading and quarantine overrides
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct IngestArgs {
    /// Field delimiter of the CSV publication
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Directory for the quarantine file
    #[arg(long = "quarantine-dir", value_name = "DIR")]
    pub quarantine_dir: Option<PathBuf>,

    /// Do not write quarantined rows to a file
    #[arg(long = "no-quarantine-file")]
    pub no_quarantine_file: bool,
}

/// Arguments for the load command
#[derive(Debug, Clone, Parser)]
pub struct LoadArgs {
    /// DOF source file (.csv, .dat or .txt)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Obstacle table to load into
    #[arg(long = "target-table", value_name = "NAME")]
    pub target_table: Option<String>,

    /// Date stamped into valid_from of loaded rows (default: today, UTC)
    #[arg(long = "valid-from", value_name = "YYYY-MM-DD")]
    pub valid_from: Option<NaiveDate>,
}

/// Arguments for the validate command
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// DOF source file (.csv, .dat or .txt)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub offline: OfflineArgs,

    #[command(flatten)]
    pub ingest: IngestArgs,
}

/// Arguments for the types command
#[derive(Debug, Clone, Parser)]
pub struct TypesArgs {
    /// DOF source file (.csv, .dat or .txt)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub offline: OfflineArgs,

    /// Field delimiter of the CSV publication
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Write the type list to a CSV file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Log level chosen on the command line, if any
    ///
    /// `None` leaves the configured level in place.
    pub fn get_log_level(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
