//! Thickness strings as printed by eLCA ("200,00 mm", "0.24 m", "12cm").
//!
//! Parsing a single thickness never aborts a stage. A malformed value resolves
//! to [`DEFAULT_LAYER_THICKNESS_M`] so the rest of the element is still
//! processed; this fallback is deliberate and callers rely on it.

use crate::error::ThicknessError;
use crate::model::LengthUnit;
use tracing::warn;

/// Thickness used when a quantity or layer size cannot be parsed (1 cm).
pub const DEFAULT_LAYER_THICKNESS_M: f64 = 0.01;

/// Parses `"<number> <unit>"` into meters.
///
/// Both `,` and `.` are accepted as decimal separator. When both occur, `.` is
/// taken as thousands separator ("1.250,5 mm"). A missing or unknown unit is
/// read as millimetres.
///
/// # Example
///
/// ```
/// use elca_bridge::parser::thickness::parse_thickness;
///
/// assert_eq!(parse_thickness("200,00 mm"), Ok(0.2));
/// assert_eq!(parse_thickness("12 cm"), Ok(0.12));
/// ```
pub fn parse_thickness(text: &str) -> Result<f64, ThicknessError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ThicknessError::Empty);
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+')))
        .unwrap_or(text.len());
    let (number, rest) = text.split_at(split);
    let unit = rest.split_whitespace().next().unwrap_or_default();

    parse_thickness_with_unit(number, unit)
}

/// Parses a bare number with a separately given unit suffix.
pub fn parse_thickness_with_unit(number: &str, unit: &str) -> Result<f64, ThicknessError> {
    let value = parse_decimal(number)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ThicknessError::OutOfRange { value });
    }
    Ok(LengthUnit::from_suffix(unit).to_metres(value))
}

/// Resolves a quantity string to meters, never failing.
///
/// Empty text means "no thickness" and yields `0.0`. Anything unparseable
/// yields [`DEFAULT_LAYER_THICKNESS_M`].
#[must_use]
pub fn resolve_thickness_m(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    match parse_thickness(text) {
        Ok(metres) => metres,
        Err(err) => {
            warn!(text, %err, "unparseable thickness, using default");
            DEFAULT_LAYER_THICKNESS_M
        }
    }
}

/// Same result as [`resolve_thickness_m`] without logging, for code that runs
/// on every redraw.
#[must_use]
pub fn thickness_or_default(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    parse_thickness(text).unwrap_or(DEFAULT_LAYER_THICKNESS_M)
}

fn parse_decimal(number: &str) -> Result<f64, ThicknessError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(ThicknessError::Empty);
    }

    let normalized = if number.contains(',') && number.contains('.') {
        number.replace('.', "").replace(',', ".")
    } else {
        number.replace(',', ".")
    };

    normalized
        .parse::<f64>()
        .map_err(|_| ThicknessError::InvalidNumber {
            text: number.to_string(),
        })
}
