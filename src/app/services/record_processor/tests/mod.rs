//! Tests for the record processing components
//!
//! Fixtures build rows shaped like the output of the delimited reader for
//! the seeded CSV configuration.

pub mod validator_tests;

use crate::app::models::{RawRow, WorkingRow};
use crate::app::services::format_config::tests::csv_config;
use crate::app::services::obstacle_types::ObstacleTypeIndex;
use crate::app::services::record_processor::RowTransformer;

/// Valid values for every column the CSV configuration selects
pub const CSV_ROW: &[(&str, &str)] = &[
    ("VERIFIED STATUS", "O"),
    ("CITY", "MOBILE"),
    ("QUANTITY", "1"),
    ("AGL", "254"),
    ("AMSL", "280"),
    ("LIGHTING", "R"),
    ("MARKING", "N"),
    ("FAA STUDY", "2009ASO01234OE"),
    ("ACTION", "A"),
    ("JDATE", "2009123"),
    ("LATDEC", "30.6916667"),
    ("LONDEC", "-88.0433333"),
    ("OAS", "01-000001"),
    ("ACCURACY", "4D"),
    ("TYPE", "TOWER"),
];

/// A delimited source row with some values replaced
pub fn csv_row(line: usize, overrides: &[(&str, &str)]) -> RawRow {
    let mut row = RawRow::from_pairs(line, CSV_ROW.iter().copied());
    for (name, value) in overrides {
        row.set(*name, *value);
    }
    row
}

/// Obstacle number for a test row, unique per line
pub fn identifier(line: usize) -> String {
    format!("01-{:06}", line)
}

pub fn type_index() -> ObstacleTypeIndex {
    ObstacleTypeIndex::from_pairs(vec![
        ("TOWER".to_string(), 1),
        ("BLDG".to_string(), 2),
        ("STACK".to_string(), 3),
    ])
    .unwrap()
}

/// Run the pre-validation steps with the CSV configuration
pub fn prepared(row: RawRow) -> WorkingRow {
    RowTransformer::new(&csv_config()).transform(row).unwrap()
}
