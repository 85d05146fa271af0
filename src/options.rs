//
// options.rs
// Dicom-Convert-rs
//
// Caller-facing conversion options and their pixel-normalized counterpart, with the default layering shared by every operation.
//
// Thales Matheus Mendonça Santos - December 2025

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ConvertError, Result};
use crate::units::{self, Dimension};

/// Rendering hint carried with the options. No toolkit flag consumes it today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Blur,
}

/// Options as supplied by the caller. Every field is optional; dimension fields accept
/// either pixels or text such as `"10cm"`.
///
/// Field names serialize in camelCase so the same JSON documents used with other DICOM
/// print tooling (`filmWidth`, `pageMargin`, ...) can be loaded directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_v: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_h: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub film_width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub film_height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_margin: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_spacing: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

/// Options after defaults were layered in and every dimension was converted to pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedOptions {
    pub dpi: Option<f64>,
    pub background: String,
    pub quality: u8,
    pub flip_v: bool,
    pub flip_h: bool,
    pub trim: bool,
    pub columns: u32,
    pub rows: u32,
    pub film_width: Option<f64>,
    pub film_height: Option<f64>,
    pub page_margin: f64,
    pub box_spacing: f64,
    pub page_rotation: f64,
    pub filter: Option<Filter>,
}

impl Default for NormalizedOptions {
    fn default() -> Self {
        Self {
            dpi: None,
            background: "black".to_string(),
            quality: 90,
            flip_v: false,
            flip_h: false,
            trim: false,
            columns: 3,
            rows: 3,
            film_width: None,
            film_height: None,
            page_margin: 0.0,
            box_spacing: 0.0,
            page_rotation: 0.0,
            filter: None,
        }
    }
}

/// Defaults applied to every operation before its own defaults.
pub fn global_defaults() -> Value {
    json!({
        "quality": 90,
        "flipV": false,
        "flipH": false,
    })
}

/// Layout defaults used by mosaic composition.
pub fn mosaic_defaults() -> Value {
    json!({
        "background": "black",
        "pageMargin": 0,
        "boxSpacing": 0,
        "pageRotation": 0,
        "columns": 3,
        "rows": 3,
    })
}

impl ConvertOptions {
    /// Layer global defaults, then `operation_defaults`, then `self`, and normalize the
    /// result exactly once.
    pub fn normalize(&self, operation_defaults: Value, default_dpi: f64) -> Result<NormalizedOptions> {
        let caller = serde_json::to_value(self)
            .map_err(|err| ConvertError::InvalidConfiguration(err.to_string()))?;

        let mut merged = Map::new();
        for layer in [global_defaults(), operation_defaults, caller] {
            assign(&mut merged, layer);
        }

        let normalized = units::normalize(&Value::Object(merged), Some(default_dpi))?;
        serde_json::from_value(normalized)
            .map_err(|err| ConvertError::InvalidConfiguration(err.to_string()))
    }
}

/// Shallow assignment: top-level keys of `layer` replace those in `target`.
fn assign(target: &mut Map<String, Value>, layer: Value) {
    if let Value::Object(fields) = layer {
        target.extend(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_values_override_operation_defaults() {
        let options = ConvertOptions {
            columns: Some(2),
            background: Some("white".into()),
            ..Default::default()
        };
        let normalized = options.normalize(mosaic_defaults(), 300.0).expect("normalize");
        assert_eq!(normalized.columns, 2);
        assert_eq!(normalized.rows, 3);
        assert_eq!(normalized.background, "white");
        assert_eq!(normalized.quality, 90);
    }

    #[test]
    fn dimensions_are_converted_with_the_default_dpi() {
        let options = ConvertOptions {
            film_width: Some("10in".into()),
            page_margin: Some("2.54cm".into()),
            box_spacing: Some(Dimension::Pixels(8.0)),
            ..Default::default()
        };
        let normalized = options.normalize(mosaic_defaults(), 100.0).expect("normalize");
        assert_eq!(normalized.film_width, Some(1000.0));
        assert_eq!(normalized.page_margin, 100.0);
        assert_eq!(normalized.box_spacing, 8.0);
        assert_eq!(normalized.film_height, None);
    }

    #[test]
    fn options_dpi_wins_over_default_dpi() {
        let options = ConvertOptions {
            dpi: Some(600.0),
            page_margin: Some("1in".into()),
            ..Default::default()
        };
        let normalized = options.normalize(json!({}), 300.0).expect("normalize");
        assert_eq!(normalized.page_margin, 600.0);
    }

    #[test]
    fn unconvertible_dimension_is_a_configuration_error() {
        let options = ConvertOptions {
            film_width: Some("3furlongs".into()),
            ..Default::default()
        };
        let err = options.normalize(mosaic_defaults(), 300.0).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfiguration(_)));
    }

    #[test]
    fn camel_case_documents_deserialize() {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"filmWidth": "14in", "boxSpacing": 4, "flipH": true, "filter": "blur"}"#,
        )
        .expect("parse options");
        assert_eq!(options.film_width, Some(Dimension::Text("14in".into())));
        assert_eq!(options.box_spacing, Some(Dimension::Pixels(4.0)));
        assert_eq!(options.flip_h, Some(true));
        assert_eq!(options.filter, Some(Filter::Blur));
    }
}
