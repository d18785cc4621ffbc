//! Test fixtures for format configuration and the components that consume it
//!
//! The settings payloads mirror the records stored in `dof_conf`. Other
//! service tests reuse them to build configurations and fixed-width lines.

use serde_json::{Value, json};

use super::{FormatConfiguration, parse_settings};
use crate::app::models::FileType;


/// 1-based inclusive column extents of the fixed-width test layout
pub const DAT_EXTENTS: &[(&str, usize, usize)] = &[
    ("oas_code", 1, 2),
    ("obst_number", 4, 9),
    ("verif_status_code", 11, 11),
    ("city", 13, 28),
    ("lat_src", 30, 41),
    ("lon_src", 43, 55),
    ("obst_type", 57, 74),
    ("quantity", 76, 76),
    ("agl", 78, 82),
    ("amsl", 84, 88),
    ("lighting_code", 90, 90),
    ("hor_acc_code", 92, 92),
    ("vert_acc_code", 94, 94),
    ("marking_code", 96, 96),
    ("faa_study_number", 98, 111),
    ("action", 113, 113),
    ("julian_date", 115, 121),
];

/// Delimited settings as seeded for the CSV publication
pub fn csv_settings() -> Value {
    json!({
        "csv_table_map": {
            "VERIFIED STATUS": "verif_status_code",
            "CITY": "city",
            "QUANTITY": "quantity",
            "AGL": "agl",
            "AMSL": "amsl",
            "LIGHTING": "lighting_code",
            "MARKING": "marking_code",
            "FAA STUDY": "faa_study_number",
            "ACTION": "action",
            "JDATE": "julian_date"
        },
        "coordinates_map": {
            "LATDEC": "lat",
            "LONDEC": "lon"
        },
        "parsed_map": {
            "oas_ident": "OAS",
            "accuracy": "ACCURACY",
            "obstacle_type": "TYPE"
        }
    })
}

/// Fixed-width settings with only the `fields` map; the rest is defaulted
pub fn dat_settings() -> Value {
    let fields: serde_json::Map<String, Value> = DAT_EXTENTS
        .iter()
        .map(|(name, start, end)| (name.to_string(), json!([start, end])))
        .collect();
    json!({ "fields": fields })
}

pub fn csv_config() -> FormatConfiguration {
    parse_settings(FileType::Csv, None, &csv_settings()).unwrap()
}

pub fn dat_config() -> FormatConfiguration {
    parse_settings(FileType::Dat, None, &dat_settings()).unwrap()
}

/// Build one fixed-width line, placing each value left-aligned in its extent
pub fn dat_line(values: &[(&str, &str)]) -> String {
    let width = DAT_EXTENTS.iter().map(|(_, _, end)| *end).max().unwrap_or(0);
    let mut line: Vec<char> = vec![' '; width];

    for (name, value) in values {
        let (_, start, end) = DAT_EXTENTS
            .iter()
            .find(|(field, _, _)| field == name)
            .unwrap_or_else(|| panic!("unknown fixed-width field {name}"));
        for (offset, ch) in value.chars().take(end - start + 1).enumerate() {
            line[start - 1 + offset] = ch;
        }
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

/// A complete, valid fixed-width obstacle line
pub fn valid_dat_values() -> Vec<(&'static str, &'static str)> {
    vec![
        ("oas_code", "01"),
        ("obst_number", "000001"),
        ("verif_status_code", "O"),
        ("city", "MOBILE"),
        ("lat_src", "30-41-30.00N"),
        ("lon_src", "088-02-36.00W"),
        ("obst_type", "TOWER"),
        ("quantity", "1"),
        ("agl", "00254"),
        ("amsl", "00280"),
        ("lighting_code", "R"),
        ("hor_acc_code", "4"),
        ("vert_acc_code", "D"),
        ("marking_code", "N"),
        ("faa_study_number", "2009ASO01234OE"),
        ("action", "A"),
        ("julian_date", "2009123"),
    ]
}
