//! Shared access to the map instance
//!
//! The lifecycle owns the one [`MapContext`]; every consumer holds a
//! [`MapContextRef`] handed to it explicitly. Reading through a reference
//! whose lifecycle is gone is a programming error and fails loudly.

use crate::core::config::FocusOptions;
use crate::core::geo::LatLng;
use crate::core::map::{HandleId, LifecycleState, MapHandle};
use crate::data::centroid::feature_centroid;
use crate::data::geojson::Feature;
use crate::engine::{Camera, CameraTarget};
use crate::runtime::lock_unpoisoned;
use crate::{MapError, Result};
use std::sync::{Arc, Mutex, Weak};

pub struct MapContext {
    slot: Mutex<Option<MapHandle>>,
    focus: FocusOptions,
}

impl MapContext {
    pub(crate) fn new(focus: FocusOptions) -> Self {
        Self {
            slot: Mutex::new(None),
            focus,
        }
    }

    pub(crate) fn install(&self, handle: MapHandle) {
        let previous = lock_unpoisoned(&self.slot).replace(handle);
        debug_assert!(previous.is_none(), "a map handle was already installed");
    }

    pub(crate) fn take(&self) -> Option<MapHandle> {
        lock_unpoisoned(&self.slot).take()
    }

    pub fn has_handle(&self) -> bool {
        lock_unpoisoned(&self.slot).is_some()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        lock_unpoisoned(&self.slot).as_ref().map(MapHandle::id)
    }

    /// Readiness of the current handle; `false` without one
    pub fn is_ready(&self) -> bool {
        lock_unpoisoned(&self.slot)
            .as_ref()
            .is_some_and(MapHandle::is_ready)
    }

    pub fn state(&self) -> LifecycleState {
        match lock_unpoisoned(&self.slot).as_ref() {
            None => LifecycleState::Unmounted,
            Some(handle) if handle.is_ready() => LifecycleState::Ready,
            Some(_) => LifecycleState::Created,
        }
    }

    pub fn focus_options(&self) -> FocusOptions {
        self.focus
    }

    /// Runs `f` against the live handle. `None` when there is no handle.
    ///
    /// Engine commands are serialized through this call.
    pub fn with_handle<R>(&self, f: impl FnOnce(&mut MapHandle) -> R) -> Option<R> {
        lock_unpoisoned(&self.slot).as_mut().map(f)
    }

    pub fn camera(&self) -> Option<Camera> {
        self.with_handle(|handle| handle.engine().camera())
    }

    /// Flies the camera to the feature's centroid at the focus zoom.
    ///
    /// Does nothing when there is no handle or the feature has no usable geometry.
    pub fn focus_on(&self, feature: &Feature) {
        match feature_centroid(feature) {
            Some(center) => self.focus_on_point(center),
            None => log::warn!(
                "Cannot focus on '{}': feature has no usable geometry",
                feature.company_name()
            ),
        }
    }

    pub fn focus_on_point(&self, center: LatLng) {
        let target = CameraTarget {
            center,
            zoom: self.focus.zoom,
            duration: self.focus.duration(),
        };

        let issued = self.with_handle(|handle| {
            if let Err(e) = handle.engine_mut().fly_to(target) {
                log::warn!("Camera move on map {} failed: {}", handle.id(), e);
            }
        });
        if issued.is_none() {
            log::debug!("No map handle; ignoring focus on {}", center);
        }
    }
}

/// Non-owning reference to a [`MapContext`]
#[derive(Clone)]
pub struct MapContextRef {
    inner: Weak<MapContext>,
}

impl MapContextRef {
    pub(crate) fn new(context: &Arc<MapContext>) -> Self {
        Self {
            inner: Arc::downgrade(context),
        }
    }

    /// A reference that was never attached to a lifecycle
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// The context, or a usage error when used outside its lifecycle
    pub fn get(&self) -> Result<Arc<MapContext>> {
        self.inner.upgrade().ok_or_else(|| {
            MapError::Usage("map context used outside of its map lifecycle".to_string())
        })
    }

    /// Focus through the context. Errors only on misuse; a missing handle is a no-op.
    pub fn focus_on(&self, feature: &Feature) -> Result<()> {
        self.get()?.focus_on(feature);
        Ok(())
    }
}

impl std::fmt::Debug for MapContextRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapContextRef")
            .field("attached", &(self.inner.strong_count() > 0))
            .finish()
    }
}
