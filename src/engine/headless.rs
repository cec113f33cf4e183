//! In-process engine without a display
//!
//! Keeps the full command state (sources, layers, markers, camera) in memory
//! and animates fly-to moves against the wall clock. The state is shared with
//! [`HeadlessProbe`] handles so observers can inspect an engine the lifecycle
//! owns.

use crate::core::map::EngineOptions;
use crate::data::geojson::FeatureCollection;
use crate::engine::{
    Camera, CameraTarget, EngineEvent, EngineFactory, MapEngine, MarkerId, MountRegistry,
};
use crate::layers::animation::{EasingType, FlyToAnimation};
use crate::layers::manager::LayerManager;
use crate::layers::marker::Marker;
use crate::layers::style::{LayerSpec, SourceSpec};
use crate::prelude::{HashMap, HashSet};
use crate::runtime::lock_unpoisoned;
use crate::{MapError, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug)]
struct HeadlessState {
    layers: LayerManager,
    markers: BTreeMap<MarkerId, Marker>,
    next_marker: u64,
    camera: Camera,
    flight: Option<FlyToAnimation>,
    camera_commands: Vec<CameraTarget>,
    pending_events: VecDeque<EngineEvent>,
    removed: bool,
}

impl HeadlessState {
    fn camera_at(&self, now: Instant) -> Camera {
        match &self.flight {
            Some(flight) => flight.sample(now),
            None => self.camera,
        }
    }
}

/// Read access to a headless engine's state
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    container: String,
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn source_ids(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).layers.source_ids()
    }

    pub fn source_data(&self, id: &str) -> Option<Arc<FeatureCollection>> {
        lock_unpoisoned(&self.state)
            .layers
            .get_source(id)
            .map(|source| source.data().clone())
    }

    /// Layer ids in render order
    pub fn layer_ids(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).layers.layer_ids()
    }

    pub fn layer(&self, id: &str) -> Option<LayerSpec> {
        lock_unpoisoned(&self.state).layers.get_layer(id).cloned()
    }

    pub fn markers(&self) -> Vec<Marker> {
        lock_unpoisoned(&self.state).markers.values().cloned().collect()
    }

    pub fn marker_count(&self) -> usize {
        lock_unpoisoned(&self.state).markers.len()
    }

    /// Every fly-to issued, oldest first
    pub fn camera_commands(&self) -> Vec<CameraTarget> {
        lock_unpoisoned(&self.state).camera_commands.clone()
    }

    pub fn last_camera_command(&self) -> Option<CameraTarget> {
        lock_unpoisoned(&self.state).camera_commands.last().copied()
    }

    pub fn camera_at(&self, now: Instant) -> Camera {
        lock_unpoisoned(&self.state).camera_at(now)
    }

    /// Queues a load event, as the engine would after its style loads
    pub fn emit_load(&self) {
        lock_unpoisoned(&self.state)
            .pending_events
            .push_back(EngineEvent::Load);
    }

    /// Whether the engine instance has been destroyed
    pub fn is_removed(&self) -> bool {
        lock_unpoisoned(&self.state).removed
    }
}

pub struct HeadlessEngine {
    container: String,
    style: String,
    state: Arc<Mutex<HeadlessState>>,
    live: Arc<Mutex<HashMap<String, usize>>>,
    easing: EasingType,
}

impl HeadlessEngine {
    /// Standalone engine. `auto_load` queues the load event right away.
    pub fn new(options: &EngineOptions, auto_load: bool) -> Self {
        Self::with_registry(options, auto_load, Arc::new(Mutex::new(HashMap::default())))
    }

    fn with_registry(
        options: &EngineOptions,
        auto_load: bool,
        live: Arc<Mutex<HashMap<String, usize>>>,
    ) -> Self {
        let mut pending_events = VecDeque::new();
        if auto_load {
            pending_events.push_back(EngineEvent::Load);
        }

        let state = HeadlessState {
            layers: LayerManager::new(),
            markers: BTreeMap::new(),
            next_marker: 0,
            camera: Camera {
                center: options.center,
                zoom: options.zoom,
            },
            flight: None,
            camera_commands: Vec::new(),
            pending_events,
            removed: false,
        };

        *lock_unpoisoned(&live)
            .entry(options.container.clone())
            .or_insert(0) += 1;

        Self {
            container: options.container.clone(),
            style: options.style.clone(),
            state: Arc::new(Mutex::new(state)),
            live,
            easing: EasingType::default(),
        }
    }

    pub fn with_easing(mut self, easing: EasingType) -> Self {
        self.easing = easing;
        self
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            container: self.container.clone(),
            state: self.state.clone(),
        }
    }
}

impl MapEngine for HeadlessEngine {
    fn container(&self) -> &str {
        &self.container
    }

    fn style(&self) -> &str {
        &self.style
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        lock_unpoisoned(&self.state).pending_events.drain(..).collect()
    }

    fn has_source(&self, id: &str) -> bool {
        lock_unpoisoned(&self.state).layers.has_source(id)
    }

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()> {
        lock_unpoisoned(&self.state).layers.add_source(id, source)
    }

    fn set_source_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<()> {
        lock_unpoisoned(&self.state).layers.set_source_data(id, data)
    }

    fn has_layer(&self, id: &str) -> bool {
        lock_unpoisoned(&self.state).layers.has_layer(id)
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<()> {
        lock_unpoisoned(&self.state).layers.add_layer(layer)
    }

    fn add_marker(&mut self, marker: Marker) -> Result<MarkerId> {
        let mut state = lock_unpoisoned(&self.state);
        let id = MarkerId(state.next_marker);
        state.next_marker += 1;
        state.markers.insert(id, marker);
        Ok(id)
    }

    fn remove_marker(&mut self, id: MarkerId) -> Result<()> {
        match lock_unpoisoned(&self.state).markers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(MapError::Layer(format!("marker {} does not exist", id.0))),
        }
    }

    fn fly_to(&mut self, target: CameraTarget) -> Result<()> {
        let now = Instant::now();
        let mut state = lock_unpoisoned(&self.state);
        // A new flight starts from wherever the previous one currently is
        let from = state.camera_at(now);
        state.camera = from;
        state.flight = Some(FlyToAnimation::new(from, target, now, self.easing));
        state.camera_commands.push(target);
        Ok(())
    }

    fn camera(&self) -> Camera {
        lock_unpoisoned(&self.state).camera_at(Instant::now())
    }
}

impl Drop for HeadlessEngine {
    fn drop(&mut self) {
        lock_unpoisoned(&self.state).removed = true;

        let mut live = lock_unpoisoned(&self.live);
        if let Some(count) = live.get_mut(&self.container) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                live.remove(&self.container);
            }
        }
        log::debug!("Headless engine for '{}' removed", self.container);
    }
}

/// Creates [`HeadlessEngine`]s and tracks how many are alive per mount target
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    /// Known mount targets; `None` accepts any
    targets: Option<HashSet<String>>,
    auto_load: bool,
    easing: EasingType,
    live: Arc<Mutex<HashMap<String, usize>>>,
    created: Arc<Mutex<Vec<HeadlessProbe>>>,
    mounts: MountRegistry,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self {
            targets: None,
            auto_load: true,
            easing: EasingType::default(),
            live: Arc::new(Mutex::new(HashMap::default())),
            created: Arc::new(Mutex::new(Vec::new())),
            mounts: MountRegistry::new(),
        }
    }

    /// Only these mount targets exist
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    /// Engines wait for [`HeadlessProbe::emit_load`] instead of loading on creation
    pub fn manual_load(mut self) -> Self {
        self.auto_load = false;
        self
    }

    pub fn with_easing(mut self, easing: EasingType) -> Self {
        self.easing = easing;
        self
    }

    /// Number of live engines bound to `container`
    pub fn live_count(&self, container: &str) -> usize {
        lock_unpoisoned(&self.live)
            .get(container)
            .copied()
            .unwrap_or(0)
    }

    /// Number of engines created so far, live or not
    pub fn created_count(&self) -> usize {
        lock_unpoisoned(&self.created).len()
    }

    /// Most recently created engine for `container`
    pub fn probe(&self, container: &str) -> Option<HeadlessProbe> {
        lock_unpoisoned(&self.created)
            .iter()
            .rev()
            .find(|probe| probe.container == container)
            .cloned()
    }
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for HeadlessFactory {
    fn create(&self, options: &EngineOptions) -> Result<Box<dyn MapEngine>> {
        if let Some(targets) = &self.targets {
            if !targets.contains(&options.container) {
                return Err(MapError::Configuration(format!(
                    "mount target '{}' does not exist",
                    options.container
                )));
            }
        }

        let engine = HeadlessEngine::with_registry(options, self.auto_load, self.live.clone())
            .with_easing(self.easing);
        lock_unpoisoned(&self.created).push(engine.probe());
        log::debug!(
            "Created headless engine for '{}' with style {}",
            options.container,
            options.style
        );
        Ok(Box::new(engine))
    }

    fn mounts(&self) -> &MountRegistry {
        &self.mounts
    }
}
