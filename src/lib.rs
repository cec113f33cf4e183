//! # locmap
//!
//! Map-state and data synchronization for location-list map viewers.
//!
//! The crate owns a single map engine instance per mount target, tracks its
//! readiness, ingests an asynchronously fetched GeoJSON feature collection and
//! keeps the engine's sources, layers and markers in step with that data. A
//! list view shares the same collection and drives the camera through the
//! focus operation exposed by [`MapContext`].

pub mod app;
pub mod core;
pub mod data;
pub mod engine;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::app::MapApp;

pub use crate::core::{
    config::{AppConfig, DataOptions, FocusOptions, MapOptions, SyncGate, SyncOptions},
    context::{MapContext, MapContextRef},
    geo::LatLng,
    map::{EngineOptions, LifecycleState, MapHandle, MapLifecycle},
};

pub use crate::data::{
    centroid::centroid_of,
    fetch::{GeoFetcher, HttpFetcher, StaticFetcher},
    geojson::{Feature, FeatureCollection, Geometry, Position},
    source::GeoDataSource,
};

pub use crate::engine::{
    headless::{HeadlessEngine, HeadlessFactory, HeadlessProbe},
    CameraTarget, EngineEvent, EngineFactory, MapEngine, MarkerId,
};

pub use crate::input::events::{EventManager, MapEvent};

pub use crate::layers::{
    marker::{Marker, Popup},
    style::{LayerKind, LayerSpec, SourceSpec},
    sync::{LayerSync, SyncReport},
};

pub use crate::ui::sidebar::{LocationEntry, Sidebar};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No map handle is available")]
    MissingHandle,

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs the `env_logger` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
