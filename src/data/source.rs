//! Lazily populated, re-fetchable feature collection
//!
//! The held value starts as `None`. Each load issues one request on the async
//! runtime; the completion travels back over a channel and is applied when the
//! owner calls [`GeoDataSource::poll`]. Every request carries a generation
//! number, and cancelling (url change, refresh, close) bumps it, so a response
//! that arrives after its request was superseded or its owner was torn down is
//! dropped instead of mutating state.

use crate::data::fetch::GeoFetcher;
use crate::data::geojson::FeatureCollection;
use crate::runtime::{default_spawner, AsyncHandle, AsyncSpawner};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a request, as sent back by the fetch task
struct FetchCompletion {
    generation: u64,
    url: String,
    result: Result<FeatureCollection>,
}

/// Change applied by [`GeoDataSource::poll`]
#[derive(Debug, Clone, PartialEq)]
pub enum DataUpdate {
    /// The held value was replaced
    Loaded { url: String, features: usize },
    /// The request failed; the held value is unchanged
    Failed { url: String, message: String },
}

pub struct GeoDataSource {
    url: String,
    value: Option<Arc<FeatureCollection>>,
    fetcher: Arc<dyn GeoFetcher>,
    spawner: Arc<dyn AsyncSpawner>,
    generation: u64,
    in_flight: Option<Box<dyn AsyncHandle>>,
    closed: bool,
    tx: Sender<FetchCompletion>,
    rx: Receiver<FetchCompletion>,
}

impl GeoDataSource {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn GeoFetcher>) -> Self {
        Self::with_spawner(url, fetcher, default_spawner())
    }

    pub fn with_spawner(
        url: impl Into<String>,
        fetcher: Arc<dyn GeoFetcher>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        let (tx, rx) = unbounded();
        Self {
            url: url.into(),
            value: None,
            fetcher,
            spawner,
            generation: 0,
            in_flight: None,
            closed: false,
            tx,
            rx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last successfully fetched collection
    pub fn value(&self) -> Option<Arc<FeatureCollection>> {
        self.value.clone()
    }

    /// Whether a request is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Issues a request for the current url, superseding any outstanding one
    pub fn load(&mut self) -> Result<()> {
        if self.closed {
            log::debug!("Ignoring load of {} on a closed data source", self.url);
            return Ok(());
        }

        self.cancel();
        let generation = self.generation;
        let url = self.url.clone();
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();

        log::debug!("Fetching feature collection from {} (generation {})", url, generation);
        let task = async move {
            let result = fetcher.fetch(&url).await;
            let _ = tx.send(FetchCompletion {
                generation,
                url,
                result,
            });
        };

        self.in_flight = Some(self.spawner.spawn_boxed(task.boxed())?);
        Ok(())
    }

    /// Points the source at a new url and loads it. Returns `false` if the url is unchanged.
    pub fn set_url(&mut self, url: impl Into<String>) -> Result<bool> {
        let url = url.into();
        if url == self.url {
            return Ok(false);
        }
        self.url = url;
        self.load()?;
        Ok(true)
    }

    /// Re-fetches the current url
    pub fn refresh(&mut self) -> Result<()> {
        self.load()
    }

    /// Aborts the outstanding request and invalidates any completion already in transit
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(task) = self.in_flight.take() {
            task.cancel();
            log::debug!("Cancelled in-flight fetch of {}", self.url);
        }
    }

    /// Cancels and refuses further loads. Used on unmount.
    pub fn close(&mut self) {
        self.cancel();
        self.closed = true;
    }

    /// Applies completions that arrived since the last poll
    pub fn poll(&mut self) -> Vec<DataUpdate> {
        let mut updates = Vec::new();

        while let Ok(completion) = self.rx.try_recv() {
            if self.closed || completion.generation != self.generation {
                log::debug!(
                    "Dropping stale response from {} (generation {}, current {})",
                    completion.url,
                    completion.generation,
                    self.generation
                );
                continue;
            }

            self.in_flight = None;
            match completion.result {
                Ok(collection) => {
                    log::info!(
                        "Loaded {} features from {}",
                        collection.len(),
                        completion.url
                    );
                    updates.push(DataUpdate::Loaded {
                        url: completion.url,
                        features: collection.len(),
                    });
                    self.value = Some(Arc::new(collection));
                }
                Err(e) => {
                    log::warn!("Failed to fetch geojson data from {}: {}", completion.url, e);
                    updates.push(DataUpdate::Failed {
                        url: completion.url,
                        message: e.to_string(),
                    });
                }
            }
        }

        // A task that ended without reporting (aborted or panicked) no longer counts as loading
        if self.in_flight.as_ref().is_some_and(|task| task.is_finished()) && self.rx.is_empty() {
            self.in_flight = None;
        }

        updates
    }

    /// Polls until no request is outstanding
    pub async fn settle(&mut self) -> Vec<DataUpdate> {
        let mut updates = self.poll();
        while self.is_loading() {
            tokio::time::sleep(Duration::from_millis(1)).await;
            updates.extend(self.poll());
        }
        updates
    }
}

impl Drop for GeoDataSource {
    fn drop(&mut self) {
        self.cancel();
    }
}
