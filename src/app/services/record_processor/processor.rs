//! Main record processor implementation and per-row pipeline orchestration
//!
//! Takes the rows read from a source file through rename and decomposition,
//! coordinate conversion, validation and record construction. Per-row
//! failures become quarantine entries; an obstacle type missing from the
//! reference table fails the whole batch.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::builder::{BuildError, RecordBuilder};
use super::stats::{ProcessingResult, ProcessingStats};
use super::transform::RowTransformer;
use super::validator::{RowValidator, ValidationRules};
use crate::app::services::dof_reader::ReadResult;
use crate::app::services::format_config::FormatConfiguration;
use crate::app::services::obstacle_types::ObstacleTypeIndex;
use crate::{Error, Result};

/// Record processor for one format configuration
#[derive(Debug)]
pub struct RecordProcessor<'a> {
    config: &'a FormatConfiguration,
    obstacle_types: &'a ObstacleTypeIndex,
    validator: RowValidator,
}

impl<'a> RecordProcessor<'a> {
    pub fn new(config: &'a FormatConfiguration, obstacle_types: &'a ObstacleTypeIndex) -> Self {
        Self {
            config,
            obstacle_types,
            validator: RowValidator::new(ValidationRules::for_format(config)),
        }
    }

    /// Process the rows of one source file
    ///
    /// Rows rejected by the reader are carried into the quarantine set
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownObstacleTypes`] listing every distinct type
    /// name that is missing from the reference table.
    pub fn process(&self, read: ReadResult) -> Result<ProcessingResult> {
        let mut stats = ProcessingStats::new();
        stats.rows_read = read.total_rows();
        info!("Processing {} rows", stats.rows_read);

        let mut quarantined = read.rejected;

        // Step 1: Rename, accuracy format, split identifier, convert coordinates
        let transformer = RowTransformer::new(self.config);
        let mut prepared = Vec::with_capacity(read.rows.len());
        for row in read.rows {
            let mut working = transformer.prepare(row);
            let checked = self
                .validator
                .check_accuracy(&working.fields)
                .and_then(|()| transformer.decompose(&mut working));
            match checked {
                Ok(()) => prepared.push(working),
                Err(error) => {
                    debug!("Quarantined line {}: {}", working.line(), error);
                    quarantined.push(working.quarantine(&error));
                }
            }
        }

        // Step 2: Required values, numeric coercion
        let outcome = self.validator.validate_batch(prepared);
        quarantined.extend(outcome.quarantined);

        // Step 3: Build records and resolve obstacle types
        let builder = RecordBuilder::new(self.config, self.obstacle_types);
        let mut records = Vec::with_capacity(outcome.accepted.len());
        let mut unknown_types = BTreeSet::new();

        for row in outcome.accepted {
            match builder.build(&row) {
                Ok(record) => records.push(record),
                Err(BuildError::Row(error)) => {
                    debug!("Quarantined line {}: {}", row.line(), error);
                    quarantined.push(row.quarantine(&error));
                }
                Err(BuildError::UnknownObstacleType(name)) => {
                    unknown_types.insert(name);
                }
            }
        }

        if !unknown_types.is_empty() {
            return Err(Error::unknown_obstacle_types(unknown_types.into_iter().collect()));
        }

        quarantined.sort_by_key(|entry| entry.row.line);
        for entry in &quarantined {
            stats.add_quarantined(entry.reason);
        }
        stats.accepted = records.len();

        if stats.quarantined > 0 {
            warn!("{} rows quarantined", stats.quarantined);
        }
        info!("Record processing complete: {}", stats.summary());

        Ok(ProcessingResult {
            records,
            quarantined,
            stats,
        })
    }
}
