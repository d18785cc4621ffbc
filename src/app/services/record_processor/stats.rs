//! Processing statistics and result structures for record processing
//!
//! This module provides types for counting accepted and quarantined rows
//! and organizing the processed records for the loader.

use std::collections::BTreeMap;

use crate::app::models::{ObstacleRecord, QuarantineEntry, QuarantineReason};

/// Statistics for one processing run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    /// Rows read from the source, including those rejected on extraction
    pub rows_read: usize,
    /// Rows that became obstacle records
    pub accepted: usize,
    /// Rows quarantined for any reason
    pub quarantined: usize,
    /// Quarantined rows per reason
    pub by_reason: BTreeMap<QuarantineReason, usize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one quarantined row
    pub fn add_quarantined(&mut self, reason: QuarantineReason) {
        self.quarantined += 1;
        *self.by_reason.entry(reason).or_insert(0) += 1;
    }

    /// Quarantined rows for a reason
    pub fn quarantined_for(&self, reason: QuarantineReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Calculate acceptance rate as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.rows_read == 0 {
            100.0
        } else {
            (self.accepted as f64 / self.rows_read as f64) * 100.0
        }
    }

    /// Every row read is either accepted or quarantined
    pub fn is_balanced(&self) -> bool {
        self.accepted + self.quarantined == self.rows_read
    }

    /// Get a summary string of processing results
    pub fn summary(&self) -> String {
        format!(
            "Read: {}, Accepted: {}, Quarantined: {} ({:.1}% accepted)",
            self.rows_read,
            self.accepted,
            self.quarantined,
            self.acceptance_rate()
        )
    }
}

/// Result of processing with records and statistics
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Records ready for loading, in source order
    pub records: Vec<ObstacleRecord>,
    /// Rejected rows, ordered by source line
    pub quarantined: Vec<QuarantineEntry>,
    pub stats: ProcessingStats,
}

impl ProcessingResult {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn has_quarantined(&self) -> bool {
        !self.quarantined.is_empty()
    }
}
