//! Feature collection fetchers
//!
//! [`GeoFetcher`] is the seam between [`GeoDataSource`](crate::data::source::GeoDataSource)
//! and wherever the collection comes from. [`HttpFetcher`] issues one `GET`
//! per call; [`StaticFetcher`] serves canned documents for offline use and tests.

use crate::data::geojson::FeatureCollection;
use crate::prelude::HashMap;
use crate::{MapError, Result};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait GeoFetcher: Send + Sync {
    /// Fetches and parses the whole collection behind `url`
    async fn fetch(&self, url: &str) -> Result<FeatureCollection>;
}

/// Fetches a GeoJSON document over HTTP.
///
/// Non-2xx responses and unparsable bodies are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(25))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("locmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeoFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        FeatureCollection::from_str(&body)
    }
}

/// Serves GeoJSON documents from memory, keyed by URL
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    pub fn with_collection(self, url: impl Into<String>, collection: &FeatureCollection) -> Result<Self> {
        let body = serde_json::to_string(collection)?;
        Ok(self.with_document(url, body))
    }
}

#[async_trait]
impl GeoFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection> {
        match self.documents.get(url) {
            Some(body) => FeatureCollection::from_str(body),
            None => Err(MapError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
