//! Read statistics and result structures for DOF source files

use crate::app::models::{QuarantineEntry, RawRow};

/// Rows read from one source file
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// Rows extracted cleanly, in file order
    pub rows: Vec<RawRow>,

    /// Records that could not be extracted at all
    pub rejected: Vec<QuarantineEntry>,

    pub stats: ReadStats,
}

impl ReadResult {
    /// Rows read, whether extracted or rejected
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.rejected.len()
    }
}

/// Simple read statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReadStats {
    /// Data records encountered (header and blank lines excluded)
    pub records: usize,

    /// Records extracted into rows
    pub extracted: usize,

    /// Records rejected during extraction
    pub rejected: usize,

    /// Header lines skipped before the data
    pub header_lines: usize,

    /// Blank lines skipped inside the data
    pub blank_lines: usize,
}

impl ReadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of records extracted as a percentage
    pub fn extraction_rate(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            (self.extracted as f64 / self.records as f64) * 100.0
        }
    }
}
