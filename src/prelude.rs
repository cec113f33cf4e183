//! Prelude module for common locmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use locmap::prelude::*;`

pub use crate::core::{
    config::{AppConfig, DataOptions, FocusOptions, MapOptions, SyncGate, SyncOptions},
    context::{MapContext, MapContextRef},
    geo::LatLng,
    map::{EngineOptions, LifecycleState, MapHandle, MapLifecycle},
};

pub use crate::data::{
    centroid::{centroid_of, feature_centroid},
    fetch::{GeoFetcher, HttpFetcher, StaticFetcher},
    geojson::{Feature, FeatureCollection, Geometry},
    source::{DataUpdate, GeoDataSource},
};

pub use crate::engine::{
    headless::{HeadlessFactory, HeadlessProbe},
    CameraTarget, EngineEvent, EngineFactory, MapEngine,
};

pub use crate::input::events::{EventManager, MapEvent};

pub use crate::layers::{
    marker::{Marker, Popup},
    sync::{LayerSync, SyncReport},
};

pub use crate::ui::sidebar::{LocationEntry, Sidebar};

pub use crate::app::MapApp;

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
