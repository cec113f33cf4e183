//! Source and layer definitions handed to the engine
//!
//! Layers serialize to the engine's style-layer JSON, e.g.
//! `{"id": "...", "type": "line", "source": "...", "paint": {"line-color": "black", ...}}`.

use crate::core::constants::{FILL_LAYER_ID, LINE_LAYER_ID, SOURCE_ID};
use crate::data::geojson::FeatureCollection;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Data source definition
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Inline GeoJSON feature collection
    GeoJson { data: Arc<FeatureCollection> },
}

impl SourceSpec {
    pub fn geojson(data: Arc<FeatureCollection>) -> Self {
        SourceSpec::GeoJson { data }
    }

    pub fn data(&self) -> &Arc<FeatureCollection> {
        match self {
            SourceSpec::GeoJson { data } => data,
        }
    }

    pub fn to_style_json(&self) -> Result<serde_json::Value> {
        match self {
            SourceSpec::GeoJson { data } => Ok(serde_json::json!({
                "type": "geojson",
                "data": data.to_geojson_value()?,
            })),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Line,
    Fill,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Line => write!(f, "line"),
            LayerKind::Fill => write!(f, "fill"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePaint {
    #[serde(rename = "line-color")]
    pub color: String,
    #[serde(rename = "line-width")]
    pub width: f64,
    #[serde(rename = "line-blur")]
    pub blur: f64,
}

impl Default for LinePaint {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            width: 1.0,
            blur: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillPaint {
    #[serde(rename = "fill-color")]
    pub color: String,
    #[serde(rename = "fill-opacity")]
    pub opacity: f64,
}

impl Default for FillPaint {
    fn default() -> Self {
        Self {
            color: "red".to_string(),
            opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    Line(LinePaint),
    Fill(FillPaint),
}

/// Style layer reading from a named source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    pub paint: Paint,
}

impl LayerSpec {
    pub fn line(id: impl Into<String>, source: impl Into<String>, paint: LinePaint) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Line,
            source: source.into(),
            paint: Paint::Line(paint),
        }
    }

    pub fn fill(id: impl Into<String>, source: impl Into<String>, paint: FillPaint) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Fill,
            source: source.into(),
            paint: Paint::Fill(paint),
        }
    }

    pub fn to_style_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Outline layer over the company locations source
pub fn company_line_layer() -> LayerSpec {
    LayerSpec::line(LINE_LAYER_ID, SOURCE_ID, LinePaint::default())
}

/// Fill layer over the company locations source
pub fn company_fill_layer() -> LayerSpec {
    LayerSpec::fill(FILL_LAYER_ID, SOURCE_ID, FillPaint::default())
}
