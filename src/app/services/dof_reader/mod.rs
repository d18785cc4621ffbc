//! Readers for the two DOF publication layouts
//!
//! Both readers turn a source file into [`RawRow`]s keyed by source column
//! name, with every value trimmed. A record that cannot be extracted at all
//! is rejected with a [`FormatError`] and quarantined instead of aborting
//! the run.
//!
//! - [`delimited`] - CSV publication, columns selected by header name
//! - [`fixed_width`] - DAT publication, columns cut by character extents
//! - [`stats`] - Read statistics and result structures
//!
//! [`RawRow`]: crate::app::models::RawRow
//! [`FormatError`]: crate::app::models::FormatError

pub mod delimited;
pub mod fixed_width;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use stats::{ReadResult, ReadStats};

use std::path::Path;
use tracing::info;

use crate::app::services::format_config::{FormatConfiguration, SourceLayout};
use crate::{Error, Result};

/// Reader settings that come from the application config, not the stored format
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub header_lines: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: crate::constants::DEFAULT_DELIMITER,
            header_lines: crate::constants::DAT_HEADER_LINES,
        }
    }
}

/// Reads a DOF source file through the layout of its format configuration
#[derive(Debug)]
pub struct DofReader<'a> {
    config: &'a FormatConfiguration,
    options: ReaderOptions,
}

impl<'a> DofReader<'a> {
    pub fn new(config: &'a FormatConfiguration, options: ReaderOptions) -> Self {
        Self { config, options }
    }

    /// Read a source file
    pub async fn read_file(&self, path: &Path) -> Result<ReadResult> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        info!("Reading {} source file: {}", self.config.file_type, path.display());

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

        let result = self.read_bytes(&content, &path.display().to_string())?;
        info!(
            "Read {} records ({} extracted, {} rejected)",
            result.stats.records, result.stats.extracted, result.stats.rejected
        );
        Ok(result)
    }

    /// Read source content already in memory; `source_name` is used in errors
    pub fn read_bytes(&self, content: &[u8], source_name: &str) -> Result<ReadResult> {
        match &self.config.layout {
            SourceLayout::Delimited => delimited::read(
                content,
                source_name,
                &self.config.source_columns(),
                self.options.delimiter,
            ),
            SourceLayout::FixedWidth { extents } => {
                fixed_width::read(content, extents, self.options.header_lines)
            }
        }
    }
}
