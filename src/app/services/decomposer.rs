//! Compound field decomposition
//!
//! The CSV publication packs two values into single columns: the OAS code
//! and obstacle number share the identifier column (`01-000001`), and the
//! horizontal and vertical accuracy codes share the accuracy column (`4D`).

use crate::app::models::FormatError;

/// Split a combined identifier into (OAS code, obstacle number)
///
/// The identifier must contain exactly one `-` with non-empty text on both
/// sides.
pub fn split_identifier(value: &str) -> Result<(String, String), FormatError> {
    let value = value.trim();
    let invalid = || FormatError::InvalidIdentifier {
        value: value.to_string(),
    };

    let (region, number) = value.split_once('-').ok_or_else(invalid)?;
    if number.contains('-') || region.is_empty() || number.is_empty() {
        return Err(invalid());
    }

    Ok((region.to_string(), number.to_string()))
}

/// Split a combined accuracy code into (horizontal code, vertical code)
///
/// The value must be exactly two characters: a digit for the horizontal
/// accuracy code followed by the vertical accuracy code, which is passed
/// through unchanged.
pub fn split_accuracy(value: &str) -> Result<(i16, char), FormatError> {
    let value = value.trim();
    let invalid = || FormatError::InvalidAccuracy {
        value: value.to_string(),
    };

    let mut chars = value.chars();
    let (Some(horizontal), Some(vertical), None) = (chars.next(), chars.next(), chars.next())
    else {
        return Err(invalid());
    };

    let horizontal = horizontal.to_digit(10).ok_or_else(invalid)?;
    Ok((horizontal as i16, vertical))
}
