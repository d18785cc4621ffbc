//! Construction of [`ObstacleRecord`]s from validated rows

use crate::app::models::{CoordinateError, FormatError, ObstacleRecord, RawRow, RowError, WorkingRow};
use crate::app::services::decomposer::split_accuracy;
use crate::app::services::format_config::FormatConfiguration;
use crate::app::services::obstacle_types::ObstacleTypeIndex;
use crate::constants::{TEXT_FIELD_WIDTHS, fields};

/// Why a validated row did not become a record
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Per-row failure, quarantined
    Row(RowError),
    /// Type name missing from the reference table, fatal for the run
    UnknownObstacleType(String),
}

impl From<RowError> for BuildError {
    fn from(error: RowError) -> Self {
        BuildError::Row(error)
    }
}

impl From<FormatError> for BuildError {
    fn from(error: FormatError) -> Self {
        BuildError::Row(error.into())
    }
}

/// Builds obstacle records for one format configuration
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    config: &'a FormatConfiguration,
    obstacle_types: &'a ObstacleTypeIndex,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(config: &'a FormatConfiguration, obstacle_types: &'a ObstacleTypeIndex) -> Self {
        Self {
            config,
            obstacle_types,
        }
    }

    /// Build a record from a row that passed validation
    ///
    /// Accuracy codes are decomposed first, then text widths and integer
    /// ranges are checked, then the obstacle type is resolved.
    pub fn build(&self, row: &WorkingRow) -> Result<ObstacleRecord, BuildError> {
        let fields_in = &row.fields;

        let (hor_acc_code, vert_acc_code) = match &self.config.roles.accuracy {
            Some(field) => split_accuracy(text(fields_in, field))?,
            None => (
                small_int(fields_in, fields::HOR_ACC_CODE)?
                    .ok_or_else(|| unparsable(fields::HOR_ACC_CODE, ""))?,
                single_char(fields_in, fields::VERT_ACC_CODE)?,
            ),
        };
        for (field, width) in TEXT_FIELD_WIDTHS {
            check_width(fields_in, field, *width)?;
        }
        let quantity = small_int(fields_in, fields::QUANTITY)?;

        let type_name = text(fields_in, &self.config.roles.obstacle_type);
        let type_id = self
            .obstacle_types
            .resolve(type_name)
            .ok_or_else(|| BuildError::UnknownObstacleType(type_name.to_string()))?;

        let latitude = row
            .latitude
            .ok_or_else(|| RowError::coordinate(fields::LAT, CoordinateError::Empty))?;
        let longitude = row
            .longitude
            .ok_or_else(|| RowError::coordinate(fields::LON, CoordinateError::Empty))?;

        Ok(ObstacleRecord {
            oas_code: text(fields_in, fields::OAS_CODE).to_string(),
            obst_number: text(fields_in, fields::OBST_NUMBER).to_string(),
            verif_status_code: text(fields_in, fields::VERIF_STATUS_CODE).to_string(),
            type_id,
            lighting_code: text(fields_in, fields::LIGHTING_CODE).to_string(),
            marking_code: text(fields_in, fields::MARKING_CODE).to_string(),
            hor_acc_code,
            vert_acc_code,
            city: text(fields_in, fields::CITY).to_string(),
            quantity,
            agl: number(fields_in, fields::AGL)?.ok_or_else(|| RowError::missing_required(fields::AGL))?,
            amsl: number(fields_in, fields::AMSL)?,
            faa_study_number: optional_text(fields_in, fields::FAA_STUDY_NUMBER),
            action: text(fields_in, fields::ACTION).to_string(),
            julian_date: optional_text(fields_in, fields::JULIAN_DATE),
            latitude,
            longitude,
        })
    }
}

fn text<'r>(row: &'r RawRow, field: &str) -> &'r str {
    row.get(field).map(str::trim).unwrap_or_default()
}

fn optional_text(row: &RawRow, field: &str) -> Option<String> {
    Some(text(row, field)).filter(|v| !v.is_empty()).map(str::to_string)
}

fn unparsable(field: &str, value: &str) -> BuildError {
    FormatError::UnparsableField {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn number(row: &RawRow, field: &str) -> Result<Option<f64>, BuildError> {
    let value = text(row, field);
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| RowError::non_numeric(field, value).into())
}

/// Whole number that fits a `smallint` column; `"1.0"` is accepted
fn small_int(row: &RawRow, field: &str) -> Result<Option<i16>, BuildError> {
    let Some(value) = number(row, field).map_err(|_| unparsable(field, text(row, field)))? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || value < f64::from(i16::MIN) || value > f64::from(i16::MAX) {
        return Err(unparsable(field, text(row, field)));
    }
    Ok(Some(value as i16))
}

/// Text must fit its obstacle table column
fn check_width(row: &RawRow, field: &str, width: usize) -> Result<(), BuildError> {
    let value = text(row, field);
    if value.chars().count() > width {
        return Err(unparsable(field, value));
    }
    Ok(())
}

fn single_char(row: &RawRow, field: &str) -> Result<char, BuildError> {
    let value = text(row, field);
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(unparsable(field, value)),
    }
}
