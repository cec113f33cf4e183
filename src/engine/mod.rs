//! Rendering engine seam
//!
//! [`MapEngine`] is the command surface of one live engine instance: sources,
//! layers, markers and the camera. Engines are created only through an
//! [`EngineFactory`] and destroyed by dropping them, which only the map
//! lifecycle does.

pub mod headless;

use crate::core::geo::LatLng;
use crate::core::map::EngineOptions;
use crate::data::geojson::FeatureCollection;
use crate::layers::marker::Marker;
use crate::layers::style::{LayerSpec, SourceSpec};
use crate::prelude::HashSet;
use crate::runtime::lock_unpoisoned;
use crate::{MapError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identifier an engine assigns to a marker it placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Events reported by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The style and initial tiles finished loading
    Load,
}

/// Animated camera move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub center: LatLng,
    pub zoom: f64,
    pub duration: Duration,
}

/// Current camera position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: f64,
}

pub trait MapEngine: Send {
    /// Mount target this instance is bound to
    fn container(&self) -> &str;

    fn style(&self) -> &str;

    /// Drains events raised since the last call
    fn poll_events(&mut self) -> Vec<EngineEvent>;

    fn has_source(&self, id: &str) -> bool;

    /// Adds a source. Fails if the id is taken.
    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()>;

    /// Replaces the data of an existing GeoJSON source
    fn set_source_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<()>;

    fn has_layer(&self, id: &str) -> bool;

    /// Adds a layer on top. Fails if the id is taken or its source is unknown.
    fn add_layer(&mut self, layer: LayerSpec) -> Result<()>;

    fn add_marker(&mut self, marker: Marker) -> Result<MarkerId>;

    fn remove_marker(&mut self, id: MarkerId) -> Result<()>;

    fn fly_to(&mut self, target: CameraTarget) -> Result<()>;

    fn camera(&self) -> Camera;
}

/// Creates engine instances for mount targets
pub trait EngineFactory: Send + Sync {
    /// Builds an engine bound to `options.container`.
    ///
    /// Returns [`MapError::Configuration`] when the mount target does not exist.
    fn create(&self, options: &EngineOptions) -> Result<Box<dyn MapEngine>>;

    /// Mount targets currently bound to a live map, shared by every lifecycle using this factory
    fn mounts(&self) -> &MountRegistry;
}

/// Mount targets that currently have a live map handle
#[derive(Debug, Clone, Default)]
pub struct MountRegistry {
    claimed: Arc<Mutex<HashSet<String>>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `container`. Fails with [`MapError::Configuration`] while another claim holds it.
    pub fn claim(&self, container: &str) -> Result<MountClaim> {
        if !lock_unpoisoned(&self.claimed).insert(container.to_string()) {
            return Err(MapError::Configuration(format!(
                "mount target '{}' already has a map",
                container
            )));
        }
        Ok(MountClaim {
            registry: self.clone(),
            container: container.to_string(),
        })
    }

    pub fn is_claimed(&self, container: &str) -> bool {
        lock_unpoisoned(&self.claimed).contains(container)
    }
}

/// Exclusive hold on a mount target; released on drop
#[derive(Debug)]
pub struct MountClaim {
    registry: MountRegistry,
    container: String,
}

impl MountClaim {
    pub fn container(&self) -> &str {
        &self.container
    }
}

impl Drop for MountClaim {
    fn drop(&mut self) {
        lock_unpoisoned(&self.registry.claimed).remove(&self.container);
    }
}
