//! Rename, identifier decomposition and coordinate conversion
//!
//! These are the per-row steps that run before validation. Each returns the
//! first failure as a [`RowError`] and leaves quarantining to the caller.

use crate::app::models::{RawRow, RowError, WorkingRow};
use crate::app::services::coordinates::{CoordinateAxis, parse_coordinate};
use crate::app::services::decomposer::split_identifier;
use crate::app::services::format_config::FormatConfiguration;
use crate::constants::fields;

/// Applies the renaming and decomposition steps of a format configuration
#[derive(Debug, Clone, Copy)]
pub struct RowTransformer<'a> {
    config: &'a FormatConfiguration,
}

impl<'a> RowTransformer<'a> {
    pub fn new(config: &'a FormatConfiguration) -> Self {
        Self { config }
    }

    /// Run rename, identifier split and coordinate conversion on a row
    pub fn transform(&self, row: RawRow) -> Result<WorkingRow, (WorkingRow, RowError)> {
        let mut working = self.prepare(row);
        match self.decompose(&mut working) {
            Ok(()) => Ok(working),
            Err(error) => Err((working, error)),
        }
    }

    /// Start a working row with the rename map applied
    pub fn prepare(&self, row: RawRow) -> WorkingRow {
        let mut working = WorkingRow::new(row);
        self.rename(&mut working.fields);
        working
    }

    /// Split the identifier and convert coordinates of a prepared row
    pub fn decompose(&self, working: &mut WorkingRow) -> Result<(), RowError> {
        self.split_identifier(&mut working.fields)?;
        self.convert_coordinates(working)
    }

    fn rename(&self, fields: &mut RawRow) {
        for (from, to) in &self.config.rename_map {
            fields.rename(from, to);
        }
    }

    fn split_identifier(&self, row: &mut RawRow) -> Result<(), RowError> {
        let Some(field) = &self.config.roles.identifier else {
            return Ok(());
        };

        let value = row.remove(field).unwrap_or_default();
        let (oas_code, obst_number) = split_identifier(&value)?;
        row.set(fields::OAS_CODE, oas_code);
        row.set(fields::OBST_NUMBER, obst_number);
        Ok(())
    }

    fn convert_coordinates(&self, working: &mut WorkingRow) -> Result<(), RowError> {
        for (field, axis) in &self.config.coordinate_map {
            let value = working.fields.remove(field).unwrap_or_default();
            let decimal =
                parse_coordinate(&value, *axis).map_err(|e| RowError::coordinate(field, e))?;

            match axis {
                CoordinateAxis::Latitude => working.latitude = Some(decimal),
                CoordinateAxis::Longitude => working.longitude = Some(decimal),
            }
        }
        Ok(())
    }
}
