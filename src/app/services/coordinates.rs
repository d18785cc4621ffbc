//! Coordinate conversion from DMS notation to decimal degrees
//!
//! DOF coordinates are published as `D-M-S` followed by a hemisphere letter,
//! e.g. `40-26-46.00N`. Every downstream spatial query depends on this
//! conversion, so validation is strict: anything that does not parse cleanly
//! and fall inside the valid range is rejected.

use crate::app::models::CoordinateError;
use regex::Regex;
use std::sync::LazyLock;

static DMS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})-(\d{1,2})-(\d+(?:\.\d+)?)$").expect("DMS pattern is valid")
});

const HEMISPHERES: [char; 4] = ['N', 'S', 'E', 'W'];

/// Coordinate axis, which fixes the maximum degree value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAxis {
    Latitude,
    Longitude,
}

impl CoordinateAxis {
    /// Maximum absolute degree value for this axis
    pub fn max_degree(&self) -> u16 {
        match self {
            CoordinateAxis::Latitude => 90,
            CoordinateAxis::Longitude => 180,
        }
    }

    /// Parse the axis tag used in coordinate maps (`lat` / `lon`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "lat" => Some(CoordinateAxis::Latitude),
            "lon" => Some(CoordinateAxis::Longitude),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            CoordinateAxis::Latitude => "lat",
            CoordinateAxis::Longitude => "lon",
        }
    }
}

/// Convert a DMS coordinate (`D-M-S[.s]H`) to signed decimal degrees
///
/// `max_degree` is 90 for latitude and 180 for longitude. The value is
/// negated for the southern and western hemispheres.
///
/// # Errors
///
/// Returns [`CoordinateError`] when the hemisphere is not one of N, S, E, W,
/// the components are malformed, minutes or seconds are not in `[0, 60)`,
/// degrees exceed `max_degree`, or degrees equal `max_degree` with non-zero
/// minutes or seconds.
pub fn dms_to_decimal_degrees(raw: &str, max_degree: u16) -> Result<f64, CoordinateError> {
    let value = raw.trim();
    let hemisphere = value.chars().last().ok_or(CoordinateError::Empty)?;

    if !HEMISPHERES.contains(&hemisphere) {
        return Err(CoordinateError::InvalidHemisphere {
            value: value.to_string(),
            hemisphere,
        });
    }

    let body = &value[..value.len() - hemisphere.len_utf8()];
    let captures = DMS_PATTERN
        .captures(body)
        .ok_or_else(|| CoordinateError::Malformed {
            value: value.to_string(),
        })?;

    let malformed = || CoordinateError::Malformed {
        value: value.to_string(),
    };
    let degrees: u16 = captures[1].parse().map_err(|_| malformed())?;
    let minutes: u16 = captures[2].parse().map_err(|_| malformed())?;
    let seconds: f64 = captures[3].parse().map_err(|_| malformed())?;

    if degrees > max_degree {
        return Err(CoordinateError::OutOfRange {
            value: value.to_string(),
            component: "degrees",
        });
    }
    if minutes >= 60 {
        return Err(CoordinateError::OutOfRange {
            value: value.to_string(),
            component: "minutes",
        });
    }
    if !(0.0..60.0).contains(&seconds) {
        return Err(CoordinateError::OutOfRange {
            value: value.to_string(),
            component: "seconds",
        });
    }
    if degrees == max_degree && (minutes != 0 || seconds != 0.0) {
        return Err(CoordinateError::ExceedsMaximum {
            value: value.to_string(),
            max_degree,
        });
    }

    let decimal = f64::from(degrees) + f64::from(minutes) / 60.0 + seconds / 3600.0;
    Ok(match hemisphere {
        'S' | 'W' => -decimal,
        _ => decimal,
    })
}

/// Parse a coordinate column value for the given axis
///
/// Values ending in a letter are DMS and go through
/// [`dms_to_decimal_degrees`]; anything else must be a plain signed decimal
/// within the axis range, as carried by the decimal columns of the CSV
/// publication.
pub fn parse_coordinate(raw: &str, axis: CoordinateAxis) -> Result<f64, CoordinateError> {
    let value = raw.trim();
    let last = value.chars().last().ok_or(CoordinateError::Empty)?;

    if last.is_ascii_alphabetic() {
        return dms_to_decimal_degrees(value, axis.max_degree());
    }

    let decimal: f64 = value.parse().map_err(|_| CoordinateError::Malformed {
        value: value.to_string(),
    })?;
    let max = f64::from(axis.max_degree());
    if !decimal.is_finite() || decimal.abs() > max {
        return Err(CoordinateError::ExceedsMaximum {
            value: value.to_string(),
            max_degree: axis.max_degree(),
        });
    }
    Ok(decimal)
}
