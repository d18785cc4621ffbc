//! Quarantine file output
//!
//! Quarantined rows are written once per run to a CSV file namespaced by the
//! file type and run timestamp, so earlier runs are never overwritten.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::app::models::{FileType, QuarantineEntry};
use crate::constants::{QUARANTINE_FILE_PREFIX, QUARANTINE_TIMESTAMP_FORMAT};
use crate::{Error, Result};

/// Writes quarantine entries to a directory
#[derive(Debug, Clone)]
pub struct QuarantineWriter {
    dir: PathBuf,
}

impl QuarantineWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the quarantine file for a run
    pub fn file_path(&self, file_type: FileType, run_started: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.csv",
            QUARANTINE_FILE_PREFIX,
            file_type.tag(),
            run_started.format(QUARANTINE_TIMESTAMP_FORMAT)
        ))
    }

    /// Write entries, returning the file path; nothing is written for an empty set
    ///
    /// Columns are `source_line`, every source column in first-seen order,
    /// then `reason` and `detail`. An existing file is an error.
    pub async fn write(
        &self,
        entries: &[QuarantineEntry],
        file_type: FileType,
        run_started: DateTime<Utc>,
    ) -> Result<Option<PathBuf>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let path = self.file_path(file_type, run_started);
        let file_name = path.display().to_string();
        let content = encode(entries, &file_name)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::io(
                format!("Failed to create quarantine directory {}", self.dir.display()),
                e,
            )
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Error::io(format!("Failed to create quarantine file {}", file_name), e))?;
        file.write_all(&content)
            .await
            .map_err(|e| Error::io(format!("Failed to write {}", file_name), e))?;
        file.flush()
            .await
            .map_err(|e| Error::io(format!("Failed to flush {}", file_name), e))?;

        info!("Wrote {} quarantined rows to {}", entries.len(), file_name);
        Ok(Some(path))
    }
}

/// Render entries as CSV in memory
fn encode(entries: &[QuarantineEntry], file_name: &str) -> Result<Vec<u8>> {
    let columns = source_columns(entries);
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = std::iter::once("source_line")
        .chain(columns.iter().map(String::as_str))
        .chain(["reason", "detail"]);
    writer
        .write_record(header)
        .map_err(|e| Error::csv_parsing(file_name, "Failed to write header", Some(e)))?;

    for entry in entries {
        let line = entry.row.line.to_string();
        let record = std::iter::once(line.as_str())
            .chain(columns.iter().map(|c| entry.row.get(c).unwrap_or_default()))
            .chain([entry.reason.as_str(), entry.detail.as_str()]);
        writer
            .write_record(record)
            .map_err(|e| Error::csv_parsing(file_name, "Failed to write row", Some(e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::io(format!("Failed to encode {}", file_name), e.into_error()))
}

fn source_columns(entries: &[QuarantineEntry]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for name in entries.iter().flat_map(|entry| entry.row.names()) {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}
