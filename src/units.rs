//
// units.rs
// Dicom-Convert-rs
//
// Converts physical measurements ("10cm", "2in", "25.4mm", "42px") into pixel counts at a given DPI, and applies that conversion across a whole options tree.
//
// Thales Matheus Mendonça Santos - December 2025

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{ConvertError, Result};

/// Resolution used when neither the options nor the caller provide one.
pub const DEFAULT_DPI: f64 = 300.0;

const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// A measurement as supplied by the caller: already in pixels, or text with a unit suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(f64),
    Text(String),
}

impl Dimension {
    /// Pixel count, if the value is already numeric.
    pub fn as_pixels(&self) -> Option<f64> {
        match self {
            Dimension::Pixels(px) => Some(*px),
            Dimension::Text(_) => None,
        }
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Pixels(value)
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Dimension::Text(value.to_string())
    }
}

impl FromStr for Dimension {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<f64>() {
            Ok(px) => Dimension::Pixels(px),
            Err(_) => Dimension::Text(s.to_string()),
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pixels(px) => write!(f, "{px}"),
            Dimension::Text(text) => f.write_str(text),
        }
    }
}

/// Convert a measurement to pixels. Numbers are returned unchanged.
pub fn to_pixels(value: &Dimension, dpi: f64) -> Result<Dimension> {
    match value {
        Dimension::Pixels(_) => Ok(value.clone()),
        Dimension::Text(text) => string_to_pixels(text, dpi),
    }
}

/// Convert a textual measurement to pixels.
///
/// Text without a numeric prefix, or with a suffix other than px/in/cm/mm, is handed back
/// untouched as `Dimension::Text`; this is what lets colour names and similar string options
/// survive a normalization pass.
pub fn string_to_pixels(value: &str, dpi: f64) -> Result<Dimension> {
    let Some((number, unit)) = split_numeric_prefix(value) else {
        return Ok(Dimension::Text(value.to_string()));
    };

    let inches = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "PX" => return Ok(Dimension::Pixels(number)),
        "IN" => number,
        "CM" => number / CM_PER_INCH,
        "MM" => number / MM_PER_INCH,
        _ => return Ok(Dimension::Text(value.to_string())),
    };

    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(ConvertError::InvalidConfiguration(format!(
            "Invalid value for dpi: {dpi} (needed to convert {value:?})"
        )));
    }
    Ok(Dimension::Pixels(inches * dpi))
}

/// Walk an options tree and convert every string field to pixels.
///
/// An object's own numeric `dpi` field takes precedence over `dpi` for that object and
/// everything nested below it; a `dpi` of 0 counts as unset. Non-string leaves pass through
/// unchanged, so a tree that is already fully numeric comes back identical.
pub fn normalize(options: &Value, dpi: Option<f64>) -> Result<Value> {
    match options {
        Value::Object(fields) => {
            let dpi = fields
                .get("dpi")
                .and_then(Value::as_f64)
                .filter(|own| *own != 0.0)
                .or(dpi);
            let mut normalized = Map::with_capacity(fields.len());
            for (key, value) in fields {
                let converted = normalize(value, dpi).map_err(|err| match err {
                    ConvertError::InvalidConfiguration(msg) => {
                        ConvertError::InvalidConfiguration(format!("{key}: {msg}"))
                    }
                    other => other,
                })?;
                normalized.insert(key.clone(), converted);
            }
            Ok(Value::Object(normalized))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| normalize(item, dpi))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::String(text) => {
            match string_to_pixels(text, dpi.unwrap_or(DEFAULT_DPI))? {
                Dimension::Pixels(px) => Number::from_f64(px).map(Value::Number).ok_or_else(|| {
                    ConvertError::InvalidConfiguration(format!("{text:?} is not a finite size"))
                }),
                Dimension::Text(_) => Ok(options.clone()),
            }
        }
        other => Ok(other.clone()),
    }
}

/// Split `"12.5cm"` into `(12.5, "cm")`, accepting the same prefixes a float literal would.
fn split_numeric_prefix(value: &str) -> Option<(f64, &str)> {
    let text = value.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    let number = text[..end].parse::<f64>().ok()?;
    Some((number, &text[end..]))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
