//! Row validation: accuracy format, required values and numeric coercion
//!
//! Checks run in a fixed order and the first failure names the single
//! quarantine reason of the row:
//!
//! 1. combined accuracy field is exactly two characters
//! 2. every required field is non-empty
//! 3. every numeric field that has a value parses as a number

use tracing::debug;

use crate::app::models::{FormatError, QuarantineEntry, RawRow, RowError, WorkingRow};
use crate::app::services::format_config::FormatConfiguration;
use crate::constants::{NUMERIC_FIELDS, REQUIRED_FIELDS, fields};

/// Declared field sets a row must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Combined accuracy field, checked before anything else
    pub accuracy_field: Option<String>,

    /// Fields that must hold a non-empty value
    pub required: Vec<String>,

    /// Fields that must parse as a number when non-empty
    pub numeric: Vec<String>,
}

impl ValidationRules {
    pub fn new(accuracy_field: Option<String>, required: Vec<String>, numeric: Vec<String>) -> Self {
        Self {
            accuracy_field,
            required,
            numeric,
        }
    }

    /// Rules for rows produced by a format configuration
    ///
    /// The obstacle type column is always required. Layouts that carry the
    /// accuracy codes separately require both of them instead of checking a
    /// combined field.
    pub fn for_format(config: &FormatConfiguration) -> Self {
        let mut required: Vec<String> = REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect();
        if config.roles.accuracy.is_none() {
            required.push(fields::HOR_ACC_CODE.to_string());
            required.push(fields::VERT_ACC_CODE.to_string());
        }
        required.push(config.roles.obstacle_type.clone());

        Self {
            accuracy_field: config.roles.accuracy.clone(),
            required,
            numeric: NUMERIC_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Rows split into accepted and quarantined sets
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<WorkingRow>,
    pub quarantined: Vec<QuarantineEntry>,
}

/// Applies [`ValidationRules`] to rows
#[derive(Debug, Clone)]
pub struct RowValidator {
    rules: ValidationRules,
}

impl RowValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Check one row, returning the first failure
    pub fn check(&self, row: &RawRow) -> Result<(), RowError> {
        self.check_accuracy(row)?;
        self.check_values(row)
    }

    /// Combined accuracy field must be exactly two characters
    ///
    /// Runs on the renamed row before decomposition, so a bad accuracy
    /// value is reported ahead of identifier and coordinate failures.
    pub fn check_accuracy(&self, row: &RawRow) -> Result<(), RowError> {
        let Some(field) = &self.rules.accuracy_field else {
            return Ok(());
        };
        let value = row.get(field).unwrap_or_default();
        if value.trim().chars().count() != 2 {
            return Err(FormatError::InvalidAccuracy {
                value: value.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Required values, then numeric coercion
    pub fn check_values(&self, row: &RawRow) -> Result<(), RowError> {
        for field in &self.rules.required {
            if row.get(field).is_none_or(|value| value.trim().is_empty()) {
                return Err(RowError::missing_required(field));
            }
        }

        for field in &self.rules.numeric {
            let Some(value) = row.get(field).map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            if !value.parse::<f64>().is_ok_and(f64::is_finite) {
                return Err(RowError::non_numeric(field, value));
            }
        }

        Ok(())
    }

    /// Split a batch into accepted rows and quarantine entries
    ///
    /// Every input row lands in exactly one of the two outputs, in input
    /// order.
    pub fn validate_batch(&self, rows: Vec<WorkingRow>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for row in rows {
            match self.check(&row.fields) {
                Ok(()) => outcome.accepted.push(row),
                Err(error) => {
                    debug!("Quarantined line {}: {}", row.line(), error);
                    outcome.quarantined.push(row.quarantine(&error));
                }
            }
        }

        outcome
    }
}
