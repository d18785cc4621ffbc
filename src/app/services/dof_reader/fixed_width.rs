//! Fixed-width (DAT) publication reader
//!
//! Each data line is cut into fields by character extents. Lines may end
//! early when trailing fields are blank; missing tail fields read as empty.

use tracing::{debug, warn};

use super::stats::{ReadResult, ReadStats};
use crate::Result;
use crate::app::models::{FormatError, QuarantineEntry, RawRow, RowError};
use crate::app::services::format_config::FieldExtent;

/// Read fixed-width content, skipping `header_lines` lines first
pub fn read(content: &[u8], extents: &[FieldExtent], header_lines: usize) -> Result<ReadResult> {
    let mut stats = ReadStats::new();
    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    let content = content.strip_suffix(b"\n").unwrap_or(content);
    let lines = content
        .split(|byte| *byte == b'\n')
        .take_while(|_| !content.is_empty());

    for (index, raw_line) in lines.enumerate() {
        let line_number = index + 1;
        let raw_line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);

        if index < header_lines {
            stats.header_lines += 1;
            continue;
        }
        if raw_line.iter().all(u8::is_ascii_whitespace) {
            stats.blank_lines += 1;
            continue;
        }

        stats.records += 1;
        match extract_line(line_number, raw_line, extents) {
            Ok(row) => {
                stats.extracted += 1;
                rows.push(row);
            }
            Err((row, error)) => {
                stats.rejected += 1;
                debug!("Rejected line {}: {}", line_number, error);
                rejected.push(QuarantineEntry::new(row, &RowError::from(error)));
            }
        }
    }

    if stats.rejected > 0 {
        warn!("{} fixed-width lines could not be extracted", stats.rejected);
    }

    Ok(ReadResult {
        rows,
        rejected,
        stats,
    })
}

/// Cut one line into trimmed fields
pub fn extract_line(
    line_number: usize,
    raw_line: &[u8],
    extents: &[FieldExtent],
) -> std::result::Result<RawRow, (RawRow, FormatError)> {
    let (line, valid_utf8) = match std::str::from_utf8(raw_line) {
        Ok(line) => (line.to_string(), true),
        Err(_) => (String::from_utf8_lossy(raw_line).into_owned(), false),
    };
    let chars: Vec<char> = line.chars().collect();

    let mut row = RawRow::new(line_number);
    let mut failure = None;

    for extent in extents {
        let value: String = slice_chars(&chars, extent.start, extent.end).trim().to_string();
        if failure.is_none() && value.chars().any(char::is_control) {
            failure = Some(FormatError::UnparsableField {
                field: extent.name.clone(),
                value: value.escape_default().to_string(),
            });
        }
        row.set(extent.name.as_str(), value);
    }

    if !valid_utf8 {
        let error = FormatError::MalformedRecord {
            message: "line is not valid UTF-8".to_string(),
        };
        return Err((row, error));
    }

    match failure {
        Some(error) => Err((row, error)),
        None => Ok(row),
    }
}

fn slice_chars(chars: &[char], start: usize, end: usize) -> String {
    let end = end.min(chars.len());
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect()
}
