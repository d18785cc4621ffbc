//! Tests for row validation and quarantine separation

use super::{csv_row, identifier, prepared};
use crate::app::models::{QuarantineReason, RawRow};
use crate::app::services::format_config::tests::{csv_config, dat_config};
use crate::app::services::record_processor::{RowValidator, ValidationRules};

fn csv_validator() -> RowValidator {
    RowValidator::new(ValidationRules::for_format(&csv_config()))
}

#[test]
fn test_batch_of_ten_with_four_failures() {
    let mut rows = Vec::new();
    for line in 2..12 {
        let id = identifier(line);
        let overrides: Vec<(&str, &str)> = match line {
            3 => vec![("ACCURACY", "123")],
            5 => vec![("ACCURACY", "1")],
            7 => vec![("CITY", "")],
            9 => vec![("AGL", "abc")],
            _ => vec![],
        };
        let mut row = csv_row(line, &overrides);
        row.set("OAS", id);
        rows.push(prepared(row));
    }

    let outcome = csv_validator().validate_batch(rows);

    assert_eq!(outcome.accepted.len(), 6);
    assert_eq!(outcome.quarantined.len(), 4);

    let reasons: Vec<(usize, QuarantineReason)> = outcome
        .quarantined
        .iter()
        .map(|entry| (entry.row.line, entry.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (3, QuarantineReason::InvalidAccuracy),
            (5, QuarantineReason::InvalidAccuracy),
            (7, QuarantineReason::MissingRequiredValue),
            (9, QuarantineReason::NonNumericValue),
        ]
    );

    // Outputs are disjoint and cover the input
    let accepted_lines: Vec<usize> = outcome.accepted.iter().map(|row| row.line()).collect();
    assert_eq!(accepted_lines, vec![2, 4, 6, 8, 10, 11]);
}

#[test]
fn test_accuracy_is_checked_before_other_rules() {
    let row = prepared(csv_row(2, &[("ACCURACY", "4"), ("CITY", ""), ("AGL", "x")]));
    let error = csv_validator().check(&row.fields).unwrap_err();
    assert_eq!(error.reason(), QuarantineReason::InvalidAccuracy);
}

#[test]
fn test_required_is_checked_before_numeric() {
    let row = prepared(csv_row(2, &[("CITY", "  "), ("AMSL", "high")]));
    let error = csv_validator().check(&row.fields).unwrap_err();
    assert_eq!(error.reason(), QuarantineReason::MissingRequiredValue);
    assert!(error.to_string().contains("city"));
}

#[test]
fn test_optional_numeric_may_be_empty() {
    let row = prepared(csv_row(2, &[("AMSL", ""), ("QUANTITY", "")]));
    assert!(csv_validator().check(&row.fields).is_ok());

    let row = prepared(csv_row(2, &[("AMSL", "NaN")]));
    let error = csv_validator().check(&row.fields).unwrap_err();
    assert_eq!(error.reason(), QuarantineReason::NonNumericValue);
}

#[test]
fn test_obstacle_type_is_required() {
    let row = prepared(csv_row(2, &[("TYPE", "")]));
    let error = csv_validator().check(&row.fields).unwrap_err();
    assert_eq!(error.reason(), QuarantineReason::MissingRequiredValue);
    assert!(error.to_string().contains("TYPE"));
}

#[test]
fn test_fixed_width_rules_require_split_accuracy_codes() {
    let rules = ValidationRules::for_format(&dat_config());
    assert!(rules.accuracy_field.is_none());
    assert!(rules.required.contains(&"hor_acc_code".to_string()));
    assert!(rules.required.contains(&"obst_type".to_string()));
}

#[test]
fn test_custom_rules() {
    let validator = RowValidator::new(ValidationRules::new(
        None,
        vec!["name".to_string()],
        vec!["height".to_string()],
    ));

    assert!(validator.check(&RawRow::from_pairs(1, [("name", "a"), ("height", "1.5")])).is_ok());
    assert!(validator.check(&RawRow::from_pairs(1, [("height", "1.5")])).is_err());
    assert!(validator.check(&RawRow::from_pairs(1, [("name", "a"), ("height", "1,5")])).is_err());
}
