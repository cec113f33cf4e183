//! Configuration for the map lifecycle, the data source, focus and layer sync
//!
//! Every section deserializes with defaults filled in, so a config file only
//! needs the keys it wants to override.

use crate::core::constants::{
    DEFAULT_CONTAINER, DEFAULT_DATA_URL, DEFAULT_STYLE_URL, DEFAULT_ZOOM, FOCUS_DURATION_MS,
    FOCUS_ZOOM,
};
use crate::core::geo::LatLng;
use crate::core::map::EngineOptions;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapOptions,
    pub data: DataOptions,
    pub focus: FocusOptions,
    pub sync: SyncOptions,
}

impl AppConfig {
    /// Parses a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Map construction options. Unset values fall back to the engine defaults on [`resolve`].
///
/// [`resolve`]: MapOptions::resolve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Mount target identifier
    pub container: String,
    /// Map style document URL
    pub style: Option<String>,
    /// Initial center as `[lng, lat]`
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            style: None,
            center: None,
            zoom: None,
        }
    }
}

impl MapOptions {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center.to_lng_lat());
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Fills in defaults: basemap style, `(0, 0)` center and zoom 2
    pub fn resolve(&self) -> EngineOptions {
        EngineOptions {
            container: self.container.clone(),
            style: self
                .style
                .clone()
                .unwrap_or_else(|| DEFAULT_STYLE_URL.to_string()),
            center: self
                .center
                .map(|[lng, lat]| LatLng::from_lng_lat(lng, lat))
                .unwrap_or_default(),
            zoom: self.zoom.unwrap_or(DEFAULT_ZOOM),
        }
    }
}

/// Feature collection endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOptions {
    pub url: String,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATA_URL.to_string(),
        }
    }
}

/// Camera animation issued when a list entry is selected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusOptions {
    pub zoom: f64,
    pub duration_ms: u64,
}

impl FocusOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            zoom: FOCUS_ZOOM,
            duration_ms: FOCUS_DURATION_MS,
        }
    }
}

/// Which lifecycle state must be reached before layers are synchronized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncGate {
    /// Sync as soon as the engine instance exists
    Created,
    /// Wait for the engine's first load event
    #[default]
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub gate: SyncGate,
    /// Remove markers for features that left the collection. When false,
    /// markers from earlier collections accumulate.
    pub reconcile_markers: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            gate: SyncGate::Ready,
            reconcile_markers: true,
        }
    }
}
