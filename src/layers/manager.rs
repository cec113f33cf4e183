use crate::data::geojson::FeatureCollection;
use crate::layers::style::{LayerSpec, SourceSpec};
use crate::prelude::HashMap;
use crate::{MapError, Result};
use std::sync::Arc;

/// Registry of the sources and layers attached to one engine instance.
///
/// Ids are unique: adding an id that is already present is an error, the same
/// way a real style engine rejects it.
#[derive(Debug, Default)]
pub struct LayerManager {
    sources: HashMap<String, SourceSpec>,
    layers: HashMap<String, LayerSpec>,
    /// Layer ids in render order, bottom first
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()> {
        if self.has_source(id) {
            return Err(MapError::Layer(format!("source '{}' already exists", id)));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    pub fn get_source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn set_source_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<()> {
        match self.sources.get_mut(id) {
            Some(source) => {
                *source = SourceSpec::geojson(data);
                Ok(())
            }
            None => Err(MapError::Layer(format!("source '{}' does not exist", id))),
        }
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// Adds a layer above all existing ones
    pub fn add_layer(&mut self, layer: LayerSpec) -> Result<()> {
        if self.has_layer(&layer.id) {
            return Err(MapError::Layer(format!("layer '{}' already exists", layer.id)));
        }
        if !self.has_source(&layer.source) {
            return Err(MapError::Layer(format!(
                "layer '{}' references unknown source '{}'",
                layer.id, layer.source
            )));
        }

        self.render_order.push(layer.id.clone());
        self.layers.insert(layer.id.clone(), layer);
        Ok(())
    }

    pub fn get_layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.get(id)
    }

    /// Source ids, sorted
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Layer ids in render order
    pub fn layer_ids(&self) -> Vec<String> {
        self.render_order.clone()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::style::{company_fill_layer, company_line_layer};

    fn source() -> SourceSpec {
        SourceSpec::geojson(Arc::new(FeatureCollection::default()))
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let mut manager = LayerManager::new();
        manager.add_source("company-locations", source()).unwrap();
        assert!(matches!(
            manager.add_source("company-locations", source()),
            Err(MapError::Layer(_))
        ));
        assert_eq!(manager.source_count(), 1);
    }

    #[test]
    fn test_layers_keep_insertion_order() {
        let mut manager = LayerManager::new();
        manager.add_source("company-locations", source()).unwrap();
        manager.add_layer(company_line_layer()).unwrap();
        manager.add_layer(company_fill_layer()).unwrap();

        assert_eq!(
            manager.layer_ids(),
            vec!["company-locations-layer", "company-locations-fill-layer"]
        );
        assert!(manager.add_layer(company_line_layer()).is_err());
        assert_eq!(manager.layer_count(), 2);
    }

    #[test]
    fn test_layer_needs_source() {
        let mut manager = LayerManager::new();
        assert!(manager.add_layer(company_fill_layer()).is_err());
        assert!(!manager.has_layer("company-locations-fill-layer"));
    }

    #[test]
    fn test_set_source_data() {
        let mut manager = LayerManager::new();
        assert!(manager
            .set_source_data("company-locations", Arc::new(FeatureCollection::default()))
            .is_err());

        manager.add_source("company-locations", source()).unwrap();
        let data = Arc::new(FeatureCollection::new(Vec::new()));
        manager
            .set_source_data("company-locations", data.clone())
            .unwrap();
        assert!(Arc::ptr_eq(
            manager.get_source("company-locations").unwrap().data(),
            &data
        ));
    }
}
