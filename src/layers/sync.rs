//! Keeps an engine's markers, source and layers in step with the feature collection
//!
//! A pass places one marker per feature at its centroid, adds the GeoJSON
//! source if the engine lacks it (or replaces its data when the collection
//! changed) and adds the line then fill layers if absent. Passes are
//! idempotent: repeating one for the same handle and collection changes
//! nothing, and a new collection reconciles markers instead of piling them up.

use crate::core::config::SyncGate;
use crate::core::constants::{FILL_LAYER_ID, LINE_LAYER_ID, SOURCE_ID};
use crate::core::context::MapContext;
use crate::core::map::{HandleId, MapHandle};
use crate::data::geojson::FeatureCollection;
use crate::engine::{MapEngine, MarkerId};
use crate::layers::marker::Marker;
use crate::layers::style::{company_fill_layer, company_line_layer, SourceSpec};
use crate::prelude::HashMap;
use crate::Result;
use std::sync::Arc;

/// What one pass changed on the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub markers_added: usize,
    pub markers_removed: usize,
    pub source_added: bool,
    pub source_updated: bool,
    pub layers_added: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Identity of a placed marker: its position and popup text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarkerKey {
    lat: u64,
    lng: u64,
    popup: Option<String>,
}

impl From<&Marker> for MarkerKey {
    fn from(marker: &Marker) -> Self {
        let position = marker.position();
        Self {
            lat: position.lat.to_bits(),
            lng: position.lng.to_bits(),
            popup: marker.popup().map(|popup| popup.html.clone()),
        }
    }
}

#[derive(Debug)]
pub struct LayerSync {
    reconcile_markers: bool,
    /// Handle and collection of the last completed pass
    synced: Option<(HandleId, Arc<FeatureCollection>)>,
    /// Handle the tracked markers live on
    marker_handle: Option<HandleId>,
    /// Markers placed on `marker_handle`; a key can repeat for identical features
    markers: HashMap<MarkerKey, Vec<MarkerId>>,
}

impl Default for LayerSync {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LayerSync {
    /// `reconcile_markers = false` keeps every marker ever placed on a handle
    pub fn new(reconcile_markers: bool) -> Self {
        Self {
            reconcile_markers,
            synced: None,
            marker_handle: None,
            markers: HashMap::default(),
        }
    }

    /// Whether a pass for this handle and collection would be a no-op
    pub fn is_synced(&self, handle: HandleId, data: &Arc<FeatureCollection>) -> bool {
        matches!(&self.synced, Some((id, synced)) if *id == handle && Arc::ptr_eq(synced, data))
    }

    pub fn marker_count(&self) -> usize {
        self.markers.values().map(Vec::len).sum()
    }

    /// Syncs against the context's current handle once `gate` is met.
    ///
    /// Returns `None` when there is no handle, no data yet, or the handle has
    /// not reached the gate state.
    pub fn sync_context(
        &mut self,
        context: &MapContext,
        data: Option<&Arc<FeatureCollection>>,
        gate: SyncGate,
    ) -> Result<Option<(HandleId, SyncReport)>> {
        let Some(data) = data else {
            return Ok(None);
        };

        context
            .with_handle(|handle| {
                let open = match gate {
                    SyncGate::Created => true,
                    SyncGate::Ready => handle.is_ready(),
                };
                if !open {
                    log::debug!("Map {} not ready; deferring layer sync", handle.id());
                    return Ok(None);
                }
                self.sync(handle, data).map(|report| Some((handle.id(), report)))
            })
            .unwrap_or_else(|| {
                log::debug!("No map handle; skipping layer sync");
                Ok(None)
            })
    }

    /// Runs one pass against `handle`
    pub fn sync(&mut self, handle: &mut MapHandle, data: &Arc<FeatureCollection>) -> Result<SyncReport> {
        if self.is_synced(handle.id(), data) {
            return Ok(SyncReport::default());
        }

        if self.marker_handle != Some(handle.id()) {
            // Markers of a destroyed engine went with it
            self.markers.clear();
            self.marker_handle = Some(handle.id());
        }

        let mut report = SyncReport::default();
        self.sync_markers(handle, data, &mut report)?;

        let engine = handle.engine_mut();
        if !engine.has_source(SOURCE_ID) {
            engine.add_source(SOURCE_ID, SourceSpec::geojson(data.clone()))?;
            report.source_added = true;
        } else {
            engine.set_source_data(SOURCE_ID, data.clone())?;
            report.source_updated = true;
        }

        for layer in [company_line_layer(), company_fill_layer()] {
            if !engine.has_layer(&layer.id) {
                engine.add_layer(layer)?;
                report.layers_added += 1;
            }
        }
        debug_assert!(engine.has_layer(LINE_LAYER_ID) && engine.has_layer(FILL_LAYER_ID));

        log::debug!(
            "Synced {} features to map {}: {:?}",
            data.len(),
            handle.id(),
            report
        );
        self.synced = Some((handle.id(), data.clone()));
        Ok(report)
    }

    fn sync_markers(
        &mut self,
        handle: &mut MapHandle,
        data: &FeatureCollection,
        report: &mut SyncReport,
    ) -> Result<()> {
        let wanted: Vec<Marker> = data
            .iter()
            .filter_map(|feature| {
                let marker = Marker::for_feature(feature);
                if marker.is_none() {
                    log::debug!(
                        "No marker for '{}': feature has no usable geometry",
                        feature.company_name()
                    );
                }
                marker
            })
            .collect();

        let engine = handle.engine_mut();
        let mut previous = if self.reconcile_markers {
            std::mem::take(&mut self.markers)
        } else {
            HashMap::default()
        };

        let result = reconcile(engine, wanted, &mut previous, &mut self.markers, report);

        // Whatever was not removed is still on the engine, even after a failed call
        for (key, ids) in previous {
            if !ids.is_empty() {
                self.markers.entry(key).or_default().extend(ids);
            }
        }
        result
    }
}

/// Moves markers from `previous` to `placed`, adding and removing on the engine.
///
/// Tracking only changes after the engine call succeeds, so on error every
/// marker the engine still shows is in one of the two maps.
fn reconcile(
    engine: &mut dyn MapEngine,
    wanted: Vec<Marker>,
    previous: &mut HashMap<MarkerKey, Vec<MarkerId>>,
    placed: &mut HashMap<MarkerKey, Vec<MarkerId>>,
    report: &mut SyncReport,
) -> Result<()> {
    for marker in wanted {
        let key = MarkerKey::from(&marker);
        let id = match previous.get_mut(&key).and_then(Vec::pop) {
            Some(id) => id,
            None => {
                let id = engine.add_marker(marker)?;
                report.markers_added += 1;
                id
            }
        };
        placed.entry(key).or_default().push(id);
    }

    for ids in previous.values_mut() {
        while let Some(&id) = ids.last() {
            engine.remove_marker(id)?;
            ids.pop();
            report.markers_removed += 1;
        }
    }
    Ok(())
}
