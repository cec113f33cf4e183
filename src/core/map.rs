use crate::core::config::{FocusOptions, MapOptions};
use crate::core::context::{MapContext, MapContextRef};
use crate::core::geo::LatLng;
use crate::engine::{EngineEvent, EngineFactory, MapEngine, MountClaim};
use crate::input::events::MapEvent;
use crate::{MapError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolved engine construction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub container: String,
    pub style: String,
    pub center: LatLng,
    pub zoom: f64,
}

/// Identity of one engine instance. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HandleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unmounted,
    Created,
    Ready,
}

/// Exclusive owner of one live engine instance.
///
/// Dropping the handle destroys the engine, then releases its mount target.
pub struct MapHandle {
    id: HandleId,
    options: EngineOptions,
    engine: Box<dyn MapEngine>,
    ready: bool,
    // Declared after `engine` so the target stays claimed until the engine is gone
    _claim: MountClaim,
}

impl MapHandle {
    fn new(options: EngineOptions, engine: Box<dyn MapEngine>, claim: MountClaim) -> Self {
        Self {
            id: HandleId::next(),
            options,
            engine,
            ready: false,
            _claim: claim,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn container(&self) -> &str {
        &self.options.container
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether the engine has reported its first load
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn engine(&self) -> &dyn MapEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn MapEngine {
        self.engine.as_mut()
    }

    /// Flips readiness on; `true` only the first time
    fn mark_ready(&mut self) -> bool {
        !std::mem::replace(&mut self.ready, true)
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Drop for MapHandle {
    fn drop(&mut self) {
        log::debug!("Destroying map {} on '{}'", self.id, self.options.container);
    }
}

/// Creates, tracks and tears down the single map instance of one mount target.
///
/// ```text
/// Unmounted --mount--> Created --load--> Ready
///     ^                   |                |
///     +-----unmount-------+----------------+
/// ```
///
/// Only the lifecycle writes the handle slot. Consumers receive a
/// [`MapContextRef`] and can issue engine commands but never create or
/// destroy the instance. Dropping the lifecycle unmounts.
pub struct MapLifecycle {
    options: MapOptions,
    factory: Arc<dyn EngineFactory>,
    context: Arc<MapContext>,
    mounted: bool,
}

impl MapLifecycle {
    pub fn new(options: MapOptions, focus: FocusOptions, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            options,
            factory,
            context: Arc::new(MapContext::new(focus)),
            mounted: false,
        }
    }

    /// Reference for consumers. Fails with a usage error once this lifecycle is gone.
    pub fn context(&self) -> MapContextRef {
        MapContextRef::new(&self.context)
    }

    pub fn shared(&self) -> &Arc<MapContext> {
        &self.context
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn state(&self) -> LifecycleState {
        self.context.state()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Creates the engine instance if none exists.
    ///
    /// A missing mount target is logged and leaves the lifecycle `Unmounted`.
    /// A target already held by another lifecycle is a
    /// [`MapError::Configuration`] error and also leaves it `Unmounted`.
    pub fn mount(&mut self) -> Result<Vec<MapEvent>> {
        self.mounted = true;
        if self.context.has_handle() {
            return Ok(Vec::new());
        }

        let options = self.options.resolve();
        let claim = self.factory.mounts().claim(&options.container)?;
        let engine = match self.factory.create(&options) {
            Ok(engine) => engine,
            Err(MapError::Configuration(reason)) => {
                log::warn!("Skipping map creation: {}", reason);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let handle = MapHandle::new(options, engine, claim);
        let event = MapEvent::HandleCreated {
            handle: handle.id(),
            container: handle.container().to_string(),
        };
        log::debug!(
            "Created map {} on '{}' (style {}, center {}, zoom {})",
            handle.id(),
            handle.container(),
            handle.options().style,
            handle.options().center,
            handle.options().zoom
        );
        self.context.install(handle);
        Ok(vec![event])
    }

    /// Destroys the engine instance, if any
    pub fn unmount(&mut self) -> Vec<MapEvent> {
        self.mounted = false;
        self.teardown()
    }

    fn teardown(&mut self) -> Vec<MapEvent> {
        match self.context.take() {
            Some(handle) => {
                let event = MapEvent::HandleDestroyed {
                    handle: handle.id(),
                    container: handle.container().to_string(),
                };
                drop(handle);
                vec![event]
            }
            None => Vec::new(),
        }
    }

    /// Applies new options. A different container or style recreates the
    /// instance while mounted; center and zoom alone are only recorded.
    pub fn set_options(&mut self, options: MapOptions) -> Result<Vec<MapEvent>> {
        let recreate = options.container != self.options.container || options.style != self.options.style;
        self.options = options;

        if !recreate || !self.mounted {
            return Ok(Vec::new());
        }

        let mut events = self.teardown();
        events.extend(self.mount()?);
        Ok(events)
    }

    /// Drains engine events; the first load moves `Created` to `Ready`
    pub fn poll(&mut self) -> Vec<MapEvent> {
        self.context
            .with_handle(|handle| {
                let mut events = Vec::new();
                for event in handle.engine_mut().poll_events() {
                    match event {
                        EngineEvent::Load => {
                            if handle.mark_ready() {
                                log::debug!("Map {} is ready", handle.id());
                                events.push(MapEvent::Ready {
                                    handle: handle.id(),
                                    container: handle.container().to_string(),
                                });
                            }
                        }
                    }
                }
                events
            })
            .unwrap_or_default()
    }
}

impl Drop for MapLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}
