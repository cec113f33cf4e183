use crate::core::context::MapContextRef;
use crate::data::geojson::{Feature, FeatureCollection};
use crate::{MapError, Result};
use serde::Serialize;

/// One row of the location list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationEntry {
    pub name: String,
    pub entity_type: String,
    /// Taken from the feature's address property
    pub country: String,
}

impl LocationEntry {
    pub fn from_feature(feature: &Feature) -> Self {
        Self {
            name: feature.company_name(),
            entity_type: feature.entity_type(),
            country: feature.address(),
        }
    }
}

impl std::fmt::Display for LocationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.entity_type, self.country)
    }
}

/// List view over the feature collection. Selecting an entry focuses the map on it.
#[derive(Debug, Clone)]
pub struct Sidebar {
    context: MapContextRef,
}

impl Sidebar {
    pub fn new(context: MapContextRef) -> Self {
        Self { context }
    }

    /// Entries in collection order
    pub fn entries(&self, collection: &FeatureCollection) -> Vec<LocationEntry> {
        collection.iter().map(LocationEntry::from_feature).collect()
    }

    pub fn select(&self, feature: &Feature) -> Result<()> {
        log::debug!("Selected '{}'", feature.company_name());
        self.context.focus_on(feature)
    }

    pub fn select_index(&self, collection: &FeatureCollection, index: usize) -> Result<()> {
        let feature = collection.features.get(index).ok_or_else(|| {
            MapError::Usage(format!(
                "no entry at index {} (list has {})",
                index,
                collection.len()
            ))
        })?;
        self.select(feature)
    }
}
