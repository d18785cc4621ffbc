//! Parsing and validation of stored format settings
//!
//! The stored payload is a JSON object with up to four sub-maps:
//!
//! - `csv_table_map` - source column to canonical field
//! - `coordinates_map` - coordinate column to `lat` / `lon`
//! - `parsed_map` - decomposed role to column (`oas_ident`, `accuracy`,
//!   `obstacle_type`)
//! - `fields` - fixed-width field to 1-based `[start, end]` columns
//!
//! Every check here is fatal: a configuration that passes can be applied to
//! any row without further configuration errors.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::{DecomposedRoles, FieldExtent, FormatConfiguration, SourceLayout};
use crate::app::models::FileType;
use crate::app::services::coordinates::CoordinateAxis;
use crate::constants::fields;
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct StoredSettings {
    csv_table_map: Option<Map<String, Value>>,
    coordinates_map: Option<Map<String, Value>>,
    parsed_map: Option<Map<String, Value>>,
    fields: Option<Map<String, Value>>,
}

/// Fields the delimited layout derives from its decomposed roles
const DECOMPOSED_OUTPUTS: &[&str] = &[
    fields::OAS_CODE,
    fields::OBST_NUMBER,
    fields::HOR_ACC_CODE,
    fields::VERT_ACC_CODE,
];

/// Validate a stored settings payload into a typed configuration
pub fn parse_settings(
    file_type: FileType,
    revision_date: Option<NaiveDate>,
    settings: &Value,
) -> Result<FormatConfiguration> {
    let stored: StoredSettings = serde_json::from_value(settings.clone()).map_err(|e| {
        config_error(file_type, format!("settings must be a JSON object of maps: {}", e))
    })?;

    let config = match file_type {
        FileType::Csv => parse_delimited(stored, revision_date)?,
        FileType::Dat => parse_fixed_width(stored, revision_date)?,
    };

    debug!(
        "Format configuration for '{}': {} renamed columns, {} extents",
        file_type,
        config.rename_map.len(),
        config.extents().len()
    );
    Ok(config)
}

fn parse_delimited(
    stored: StoredSettings,
    revision_date: Option<NaiveDate>,
) -> Result<FormatConfiguration> {
    let file_type = FileType::Csv;
    let rename_map = string_entries(file_type, "csv_table_map", require(file_type, "csv_table_map", stored.csv_table_map)?)?;
    let coordinate_map = coordinate_entries(
        file_type,
        require(file_type, "coordinates_map", stored.coordinates_map)?,
    )?;
    let roles = role_entries(file_type, require(file_type, "parsed_map", stored.parsed_map)?)?;

    check_unique_targets(file_type, &rename_map)?;

    if roles.identifier.is_none() {
        return Err(config_error(file_type, "parsed_map must name the 'oas_ident' column"));
    }
    if roles.accuracy.is_none() {
        return Err(config_error(file_type, "parsed_map must name the 'accuracy' column"));
    }

    for (_, target) in &rename_map {
        if DECOMPOSED_OUTPUTS.contains(&target.as_str()) {
            return Err(config_error(
                file_type,
                format!("csv_table_map target '{}' is derived from parsed_map", target),
            ));
        }
    }

    let produced: HashSet<&str> = rename_map.iter().map(|(_, to)| to.as_str()).collect();
    check_produces(file_type, &produced, fields::MAPPED_FIELDS)?;

    let config = FormatConfiguration {
        file_type,
        revision_date,
        rename_map,
        coordinate_map,
        roles,
        layout: SourceLayout::Delimited,
    };
    check_not_renamed_away(&config)?;
    check_distinct_references(&config)?;
    Ok(config)
}

fn parse_fixed_width(
    stored: StoredSettings,
    revision_date: Option<NaiveDate>,
) -> Result<FormatConfiguration> {
    let file_type = FileType::Dat;
    let extents = extent_entries(file_type, require(file_type, "fields", stored.fields)?)?;

    let rename_map = match stored.csv_table_map {
        Some(map) => string_entries(file_type, "csv_table_map", map)?,
        None => Vec::new(),
    };
    check_unique_targets(file_type, &rename_map)?;

    let coordinate_map = match stored.coordinates_map {
        Some(map) => coordinate_entries(file_type, map)?,
        None => vec![
            (fields::LAT_SRC.to_string(), CoordinateAxis::Latitude),
            (fields::LON_SRC.to_string(), CoordinateAxis::Longitude),
        ],
    };

    let roles = match stored.parsed_map {
        Some(map) => role_entries(file_type, map)?,
        None => DecomposedRoles {
            identifier: None,
            accuracy: None,
            obstacle_type: fields::OBST_TYPE.to_string(),
        },
    };
    if roles.identifier.is_some() || roles.accuracy.is_some() {
        return Err(config_error(
            file_type,
            "fixed-width layout carries identifier and accuracy fields already split; \
             parsed_map may only name 'obstacle_type'",
        ));
    }

    let config = FormatConfiguration {
        file_type,
        revision_date,
        rename_map,
        coordinate_map,
        roles,
        layout: SourceLayout::FixedWidth { extents },
    };

    let mut layout_fields: HashSet<&str> = HashSet::new();
    for extent in config.extents() {
        let name = config.renamed(&extent.name);
        if !layout_fields.insert(name) {
            return Err(config_error(
                file_type,
                format!("field '{}' appears twice after renaming", name),
            ));
        }
    }

    for (field, _) in &config.coordinate_map {
        if !layout_fields.contains(field.as_str()) {
            return Err(config_error(
                file_type,
                format!("coordinate column '{}' is not a field of the layout", field),
            ));
        }
    }
    if !layout_fields.contains(config.roles.obstacle_type.as_str()) {
        return Err(config_error(
            file_type,
            format!(
                "obstacle type column '{}' is not a field of the layout",
                config.roles.obstacle_type
            ),
        ));
    }

    check_produces(file_type, &layout_fields, fields::FIXED_WIDTH_DECOMPOSED)?;
    check_produces(file_type, &layout_fields, fields::MAPPED_FIELDS)?;
    check_distinct_references(&config)?;
    Ok(config)
}

// =============================================================================
// Sub-map parsing
// =============================================================================

fn require(file_type: FileType, key: &str, map: Option<Map<String, Value>>) -> Result<Map<String, Value>> {
    map.ok_or_else(|| config_error(file_type, format!("missing required '{}' map", key)))
}

fn string_entries(file_type: FileType, key: &str, map: Map<String, Value>) -> Result<Vec<(String, String)>> {
    map.into_iter()
        .map(|(name, value)| {
            let target = value.as_str().map(str::trim).unwrap_or_default();
            if name.trim().is_empty() || target.is_empty() {
                return Err(config_error(
                    file_type,
                    format!("'{}' entries need a non-empty name and string value (got '{}': {})", key, name, value),
                ));
            }
            Ok((name, target.to_string()))
        })
        .collect()
}

fn coordinate_entries(file_type: FileType, map: Map<String, Value>) -> Result<Vec<(String, CoordinateAxis)>> {
    let entries = string_entries(file_type, "coordinates_map", map)?;
    let mut coordinates = Vec::with_capacity(entries.len());

    for (field, tag) in entries {
        let axis = CoordinateAxis::from_tag(&tag).ok_or_else(|| {
            config_error(
                file_type,
                format!("coordinates_map value '{}' for '{}' must be 'lat' or 'lon'", tag, field),
            )
        })?;
        coordinates.push((field, axis));
    }

    for axis in [CoordinateAxis::Latitude, CoordinateAxis::Longitude] {
        let count = coordinates.iter().filter(|(_, a)| *a == axis).count();
        if count != 1 {
            return Err(config_error(
                file_type,
                format!("coordinates_map must map exactly one column to '{}' (found {})", axis.tag(), count),
            ));
        }
    }
    Ok(coordinates)
}

fn role_entries(file_type: FileType, map: Map<String, Value>) -> Result<DecomposedRoles> {
    let mut identifier = None;
    let mut accuracy = None;
    let mut obstacle_type = None;

    for (role, field) in string_entries(file_type, "parsed_map", map)? {
        let slot = match role.as_str() {
            "oas_ident" | "identifier" => &mut identifier,
            "accuracy" => &mut accuracy,
            "obstacle_type" | "obstacleType" => &mut obstacle_type,
            other => {
                return Err(config_error(
                    file_type,
                    format!("unknown parsed_map role '{}'", other),
                ));
            }
        };
        if slot.replace(field).is_some() {
            return Err(config_error(
                file_type,
                format!("parsed_map names role '{}' more than once", role),
            ));
        }
    }

    let obstacle_type = obstacle_type.ok_or_else(|| {
        config_error(file_type, "parsed_map must name the 'obstacle_type' column")
    })?;
    Ok(DecomposedRoles {
        identifier,
        accuracy,
        obstacle_type,
    })
}

fn extent_entries(file_type: FileType, map: Map<String, Value>) -> Result<Vec<FieldExtent>> {
    if map.is_empty() {
        return Err(config_error(file_type, "'fields' map is empty"));
    }

    map.into_iter()
        .map(|(name, value)| {
            let invalid = || {
                config_error(
                    file_type,
                    format!("extent of '{}' must be [start, end] with 1 <= start <= end (got {})", name, value),
                )
            };
            let (start, end): (usize, usize) =
                serde_json::from_value(value.clone()).map_err(|_| invalid())?;
            if start == 0 || start > end {
                return Err(invalid());
            }
            Ok(FieldExtent::from_one_based(name.clone(), start, end))
        })
        .collect()
}

// =============================================================================
// Cross-map checks
// =============================================================================

fn check_unique_targets(file_type: FileType, rename_map: &[(String, String)]) -> Result<()> {
    let mut seen = HashSet::new();
    for (_, target) in rename_map {
        if !seen.insert(target.as_str()) {
            return Err(config_error(
                file_type,
                format!("csv_table_map maps more than one column to '{}'", target),
            ));
        }
    }
    Ok(())
}

fn check_produces(file_type: FileType, produced: &HashSet<&str>, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| !produced.contains(field))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(config_error(
            file_type,
            format!("mapping does not produce required fields: {}", missing.join(", ")),
        ))
    }
}

/// Coordinate and role columns must still exist after renaming
///
/// A field survives renaming when it is a rename target or a column the
/// rename map leaves alone.
fn check_not_renamed_away(config: &FormatConfiguration) -> Result<()> {
    let is_target = |field: &str| config.rename_map.iter().any(|(_, to)| to == field);
    let is_source = |field: &str| config.rename_map.iter().any(|(from, _)| from == field);

    let referenced = config
        .coordinate_map
        .iter()
        .map(|(field, _)| field.as_str())
        .chain(config.role_fields());

    for field in referenced {
        if is_source(field) && !is_target(field) {
            return Err(config_error(
                config.file_type,
                format!(
                    "column '{}' is renamed to '{}' by csv_table_map; reference the renamed field",
                    field,
                    config.renamed(field)
                ),
            ));
        }
    }
    Ok(())
}

/// Coordinate and role columns must be distinct and must not be the target
/// of a canonical field that is loaded as-is
fn check_distinct_references(config: &FormatConfiguration) -> Result<()> {
    let mut seen = HashSet::new();
    let referenced = config
        .coordinate_map
        .iter()
        .map(|(field, _)| field.as_str())
        .chain(config.role_fields());

    for field in referenced {
        if !seen.insert(field) {
            return Err(config_error(
                config.file_type,
                format!("column '{}' is referenced by more than one coordinate or role", field),
            ));
        }
        if fields::MAPPED_FIELDS.contains(&field) {
            return Err(config_error(
                config.file_type,
                format!("column '{}' is both a loaded field and a coordinate or role", field),
            ));
        }
    }
    Ok(())
}

fn config_error(file_type: FileType, message: impl AsRef<str>) -> Error {
    Error::configuration(format!(
        "invalid '{}' format settings: {}",
        file_type,
        message.as_ref()
    ))
}
