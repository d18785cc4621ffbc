//! Format configuration for the DOF source layouts
//!
//! A stored settings record describes how the columns of one publication
//! layout map onto obstacle fields. It is validated into a
//! [`FormatConfiguration`] once, when the run starts, so malformed settings
//! abort the run before any row is read.
//!
//! - [`settings`] - Parsing and validation of the stored settings payload
//! - [`resolver`] - Lookup of the settings record for a file type

pub mod resolver;
pub mod settings;

#[cfg(test)]
pub mod tests;

pub use resolver::FormatResolver;
pub use settings::parse_settings;

use crate::app::models::FileType;
use crate::app::services::coordinates::CoordinateAxis;
use chrono::NaiveDate;

/// Column extent of one fixed-width field, 0-based half-open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExtent {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl FieldExtent {
    /// Convert a stored 1-based `[start, end]` pair
    pub fn from_one_based(name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            start: start.saturating_sub(1),
            end,
        }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Physical layout of the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// Delimited columns selected by header name
    Delimited,
    /// Positional columns cut from each line
    FixedWidth { extents: Vec<FieldExtent> },
}

/// Fields that carry compound or looked-up values, named as they appear in
/// the renamed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecomposedRoles {
    /// Combined OAS code and obstacle number (delimited only)
    pub identifier: Option<String>,
    /// Combined horizontal and vertical accuracy code (delimited only)
    pub accuracy: Option<String>,
    /// Obstacle type name, resolved to a type id
    pub obstacle_type: String,
}

/// Validated mapping description for one file type
#[derive(Debug, Clone, PartialEq)]
pub struct FormatConfiguration {
    pub file_type: FileType,
    pub revision_date: Option<NaiveDate>,

    /// Source column name to canonical field name, in stored order
    pub rename_map: Vec<(String, String)>,

    /// Column holding each coordinate, named as in the renamed row
    pub coordinate_map: Vec<(String, CoordinateAxis)>,

    pub roles: DecomposedRoles,
    pub layout: SourceLayout,
}

impl FormatConfiguration {
    /// Name a source column takes after renaming
    pub fn renamed<'a>(&'a self, source: &'a str) -> &'a str {
        self.rename_map
            .iter()
            .find(|(from, _)| from == source)
            .map(|(_, to)| to.as_str())
            .unwrap_or(source)
    }

    /// Source column that produces a renamed field
    pub fn source_of<'a>(&'a self, field: &'a str) -> &'a str {
        self.rename_map
            .iter()
            .find(|(_, to)| to == field)
            .map(|(from, _)| from.as_str())
            .unwrap_or(field)
    }

    /// Columns a delimited reader must select, in first-mention order
    ///
    /// Rename sources first, then the sources of the coordinate columns and
    /// of the decomposed roles.
    pub fn source_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        };

        for (from, _) in &self.rename_map {
            push(from);
        }
        for (field, _) in &self.coordinate_map {
            push(self.source_of(field));
        }
        for field in self.role_fields() {
            push(self.source_of(field));
        }
        columns
    }

    /// Field names of the decomposed roles that are configured
    pub fn role_fields(&self) -> impl Iterator<Item = &str> {
        self.roles
            .identifier
            .iter()
            .chain(self.roles.accuracy.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.roles.obstacle_type.as_str()))
    }

    /// Coordinate column for an axis
    pub fn coordinate_field(&self, axis: CoordinateAxis) -> Option<&str> {
        self.coordinate_map
            .iter()
            .find(|(_, a)| *a == axis)
            .map(|(field, _)| field.as_str())
    }

    /// Extents of the fixed-width layout; empty for delimited files
    pub fn extents(&self) -> &[FieldExtent] {
        match &self.layout {
            SourceLayout::FixedWidth { extents } => extents,
            SourceLayout::Delimited => &[],
        }
    }
}
