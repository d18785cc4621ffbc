//! Record processing for DOF rows
//!
//! This module turns the rows read from a source file into obstacle records
//! and quarantine entries. Per-row failures never abort the run; they are
//! collected with a reason so operators can inspect and resubmit the rows.
//!
//! # Architecture
//!
//! - [`processor`] - Main RecordProcessor struct and pipeline orchestration
//! - [`transform`] - Rename, identifier decomposition and coordinate conversion
//! - [`validator`] - Accuracy, required-value and numeric checks
//! - [`builder`] - Obstacle record construction and type resolution
//! - [`quarantine`] - Per-run quarantine file output
//! - [`stats`] - Processing statistics and result structures
//!
//! # Processing Pipeline
//!
//! For each row, the first failing step supplies the quarantine reason:
//!
//! 1. **Rename**: Apply the rename map
//! 2. **Accuracy**: The combined accuracy field must be two characters
//! 3. **Decompose**: Split the identifier, convert both coordinate columns
//! 4. **Validation**: Required values, numeric coercion
//! 5. **Build**: Split accuracy codes, check text widths and integer
//!    ranges, resolve type id

pub mod builder;
pub mod processor;
pub mod quarantine;
pub mod stats;
pub mod transform;
pub mod validator;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use builder::{BuildError, RecordBuilder};
pub use processor::RecordProcessor;
pub use quarantine::QuarantineWriter;
pub use stats::{ProcessingResult, ProcessingStats};
pub use transform::RowTransformer;
pub use validator::{RowValidator, ValidationOutcome, ValidationRules};
