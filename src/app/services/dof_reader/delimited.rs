//! Delimited (CSV) publication reader

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use super::stats::{ReadResult, ReadStats};
use crate::app::models::{FormatError, QuarantineEntry, RawRow, RowError};
use crate::{Error, Result};

/// Positions of the selected columns in the file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumns {
    columns: Vec<(String, usize)>,
    header_width: usize,
}

impl SelectedColumns {
    /// Locate every selected column in the header
    ///
    /// Header names are compared after trimming. A selected column that is
    /// not in the header is a configuration error.
    pub fn from_headers(headers: &StringRecord, selected: &[String]) -> Result<Self> {
        let mut columns = Vec::with_capacity(selected.len());
        let mut missing = Vec::new();

        for name in selected {
            match headers.iter().position(|header| header.trim() == name) {
                Some(index) => columns.push((name.clone(), index)),
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "Configured columns not found in file header: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            columns,
            header_width: headers.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Extract the selected fields of one record
    ///
    /// On failure the row holds whatever could be recovered, for the
    /// quarantine output.
    pub fn extract(&self, line: usize, record: &ByteRecord) -> std::result::Result<RawRow, (RawRow, FormatError)> {
        let mut row = RawRow::new(line);
        let mut failure = None;

        for (name, index) in &self.columns {
            let Some(bytes) = record.get(*index) else {
                continue;
            };
            match std::str::from_utf8(bytes) {
                Ok(value) => row.set(name.as_str(), value.trim()),
                Err(_) => {
                    let value = String::from_utf8_lossy(bytes).trim().to_string();
                    failure.get_or_insert(FormatError::UnparsableField {
                        field: name.clone(),
                        value: value.clone(),
                    });
                    row.set(name.as_str(), value);
                }
            }
        }

        if record.len() < self.header_width {
            let error = FormatError::MalformedRecord {
                message: format!(
                    "record has {} fields, header has {}",
                    record.len(),
                    self.header_width
                ),
            };
            return Err((row, error));
        }

        match failure {
            Some(error) => Err((row, error)),
            None => Ok(row),
        }
    }
}

/// Read delimited content, keeping only the selected columns
pub fn read(content: &[u8], source_name: &str, selected: &[String], delimiter: u8) -> Result<ReadResult> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| Error::csv_parsing(source_name, "Failed to read header row", Some(e)))?
        .clone();
    let columns = SelectedColumns::from_headers(&headers, selected)?;
    debug!(
        "Selected {} of {} columns from {}",
        columns.len(),
        headers.len(),
        source_name
    );

    let mut stats = ReadStats::new();
    stats.header_lines = 1;
    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    let mut record = ByteRecord::new();

    loop {
        let more = reader.read_byte_record(&mut record).map_err(|e| {
            Error::csv_parsing(
                source_name,
                format!("Failed to read record {}", stats.records + 1),
                Some(e),
            )
        })?;
        if !more {
            break;
        }

        stats.records += 1;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(stats.records + 1);

        match columns.extract(line, &record) {
            Ok(row) => {
                stats.extracted += 1;
                rows.push(row);
            }
            Err((row, error)) => {
                stats.rejected += 1;
                debug!("Rejected line {}: {}", line, error);
                rejected.push(QuarantineEntry::new(row, &RowError::from(error)));
            }
        }
    }

    if stats.rejected > 0 {
        warn!("{} records could not be extracted from {}", stats.rejected, source_name);
    }

    Ok(ReadResult {
        rows,
        rejected,
        stats,
    })
}
