//! Wires the map lifecycle, the data source, layer sync and the event queue
//!
//! [`MapApp::pump`] is the single reactive stage. Each call applies fetch
//! completions, drains engine events and then runs layer sync when the data or
//! the handle changed and the configured gate is met. Listeners registered
//! with [`MapApp::on`] see every resulting [`MapEvent`] in order.

use crate::core::config::{AppConfig, MapOptions};
use crate::core::context::MapContextRef;
use crate::core::map::{LifecycleState, MapLifecycle};
use crate::data::fetch::GeoFetcher;
use crate::data::geojson::FeatureCollection;
use crate::data::source::{DataUpdate, GeoDataSource};
use crate::engine::EngineFactory;
use crate::input::events::{EventManager, MapEvent};
use crate::layers::sync::LayerSync;
use crate::runtime::{default_spawner, AsyncSpawner};
use crate::ui::sidebar::{LocationEntry, Sidebar};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

pub struct MapApp {
    config: AppConfig,
    lifecycle: MapLifecycle,
    data: GeoDataSource,
    fetcher: Arc<dyn GeoFetcher>,
    spawner: Arc<dyn AsyncSpawner>,
    sync: LayerSync,
    events: EventManager,
}

impl MapApp {
    pub fn new(
        config: AppConfig,
        factory: Arc<dyn EngineFactory>,
        fetcher: Arc<dyn GeoFetcher>,
    ) -> Self {
        Self::with_spawner(config, factory, fetcher, default_spawner())
    }

    pub fn with_spawner(
        config: AppConfig,
        factory: Arc<dyn EngineFactory>,
        fetcher: Arc<dyn GeoFetcher>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        let lifecycle = MapLifecycle::new(config.map.clone(), config.focus, factory);
        let data = GeoDataSource::with_spawner(config.data.url.clone(), fetcher.clone(), spawner.clone());
        let sync = LayerSync::new(config.sync.reconcile_markers);

        Self {
            config,
            lifecycle,
            data,
            fetcher,
            spawner,
            sync,
            events: EventManager::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Creates the map instance and issues the initial fetch.
    ///
    /// Calling it again while mounted does nothing.
    pub fn mount(&mut self) -> Result<()> {
        if self.data.is_closed() {
            // A previous unmount closed the source; start over with a fresh one
            self.data = GeoDataSource::with_spawner(
                self.config.data.url.clone(),
                self.fetcher.clone(),
                self.spawner.clone(),
            );
        }

        let created = self.lifecycle.mount()?;
        self.events.emit_all(created);

        if self.data.value().is_none() && !self.data.is_loading() {
            self.data.load()?;
        }
        Ok(())
    }

    /// Destroys the map instance and drops any fetch still in flight
    pub fn unmount(&mut self) {
        self.data.close();
        let destroyed = self.lifecycle.unmount();
        self.events.emit_all(destroyed);
    }

    /// Applies new map options; container or style changes recreate the instance
    pub fn set_map_options(&mut self, options: MapOptions) -> Result<()> {
        self.config.map = options.clone();
        let events = self.lifecycle.set_options(options)?;
        self.events.emit_all(events);
        Ok(())
    }

    /// Points the data source at a new url; the latest request wins
    pub fn set_data_url(&mut self, url: impl Into<String>) -> Result<bool> {
        let url = url.into();
        self.config.data.url = url.clone();
        self.data.set_url(url)
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.data.refresh()
    }

    /// Register a listener for one event kind (see [`MapEvent::kind`])
    pub fn on<F>(&mut self, kind: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback);
    }

    /// Runs one reactive pass and returns the events it produced
    pub fn pump(&mut self) -> Result<Vec<MapEvent>> {
        for update in self.data.poll() {
            self.events.emit(match update {
                DataUpdate::Loaded { url, features } => MapEvent::DataLoaded { url, features },
                DataUpdate::Failed { url, message } => MapEvent::FetchFailed { url, message },
            });
        }

        let engine_events = self.lifecycle.poll();
        self.events.emit_all(engine_events);

        let data = self.data.value();
        let synced = self
            .sync
            .sync_context(self.lifecycle.shared(), data.as_ref(), self.config.sync.gate);
        match synced {
            Ok(Some((handle, report))) if !report.is_empty() => {
                self.events.emit(MapEvent::LayersSynced {
                    handle,
                    markers_added: report.markers_added,
                    markers_removed: report.markers_removed,
                    source_added: report.source_added,
                    layers_added: report.layers_added,
                });
            }
            Ok(_) => {}
            Err(e) => {
                // Keep what was queued so listeners still see it on the next pump
                log::error!("Layer sync failed: {}", e);
                return Err(e);
            }
        }

        Ok(self.events.process_events())
    }

    /// Pumps until no fetch is outstanding
    pub async fn settle(&mut self) -> Result<Vec<MapEvent>> {
        let mut events = self.pump()?;
        while self.data.is_loading() {
            tokio::time::sleep(Duration::from_millis(1)).await;
            events.extend(self.pump()?);
        }
        Ok(events)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &MapLifecycle {
        &self.lifecycle
    }

    pub fn context(&self) -> MapContextRef {
        self.lifecycle.context()
    }

    pub fn sidebar(&self) -> Sidebar {
        Sidebar::new(self.context())
    }

    /// Last successfully fetched collection
    pub fn data(&self) -> Option<Arc<FeatureCollection>> {
        self.data.value()
    }

    pub fn is_loading(&self) -> bool {
        self.data.is_loading()
    }

    /// List entries for the current collection; empty before the first load
    pub fn entries(&self) -> Vec<LocationEntry> {
        self.data
            .value()
            .map(|data| self.sidebar().entries(&data))
            .unwrap_or_default()
    }
}

impl Drop for MapApp {
    fn drop(&mut self) {
        self.unmount();
    }
}
