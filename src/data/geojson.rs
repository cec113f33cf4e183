use crate::core::constants::{
    MISSING_PROPERTY, PROP_ADDRESS, PROP_COMPANY_NAME, PROP_ENTITY_TYPE,
};
use crate::core::geo::LatLng;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON position. Extra ordinates (altitude) are accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match values.as_slice() {
            [lng, lat, ..] => Ok(Position::new(*lng, *lat)),
            _ => Err(format!(
                "position needs at least 2 ordinates, got {}",
                values.len()
            )),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(position: Position) -> Self {
        [position.lng, position.lat]
    }
}

impl From<Position> for LatLng {
    fn from(position: Position) -> Self {
        LatLng::from_lng_lat(position.lng, position.lat)
    }
}

impl From<Position> for geo_types::Coord<f64> {
    fn from(position: Position) -> Self {
        geo_types::Coord {
            x: position.lng,
            y: position.lat,
        }
    }
}

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    pub fn point(lng: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: Position::new(lng, lat),
        }
    }

    /// Single-ring polygon from `[lng, lat]` pairs
    pub fn polygon(ring: &[[f64; 2]]) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring.iter().map(|[lng, lat]| Position::new(*lng, *lat)).collect()],
        }
    }

    /// GeoJSON type name
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

fn line_string(positions: &[Position]) -> geo_types::LineString<f64> {
    positions.iter().copied().map(geo_types::Coord::from).collect()
}

fn polygon(rings: &[Vec<Position>]) -> geo_types::Polygon<f64> {
    let mut rings = rings.iter().map(|ring| line_string(ring));
    let exterior = rings.next().unwrap_or_else(|| geo_types::LineString::new(Vec::new()));
    geo_types::Polygon::new(exterior, rings.collect())
}

impl From<&Geometry> for geo_types::Geometry<f64> {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point { coordinates } => {
                geo_types::Point::from(geo_types::Coord::from(*coordinates)).into()
            }
            Geometry::LineString { coordinates } => line_string(coordinates).into(),
            Geometry::Polygon { coordinates } => polygon(coordinates).into(),
            Geometry::MultiPoint { coordinates } => geo_types::MultiPoint::new(
                coordinates
                    .iter()
                    .map(|c| geo_types::Point::from(geo_types::Coord::from(*c)))
                    .collect(),
            )
            .into(),
            Geometry::MultiLineString { coordinates } => geo_types::MultiLineString::new(
                coordinates.iter().map(|line| line_string(line)).collect(),
            )
            .into(),
            Geometry::MultiPolygon { coordinates } => geo_types::MultiPolygon::new(
                coordinates.iter().map(|rings| polygon(rings)).collect(),
            )
            .into(),
            Geometry::GeometryCollection { geometries } => geo_types::Geometry::GeometryCollection(
                geo_types::GeometryCollection(geometries.iter().map(geo_types::Geometry::from).collect()),
            ),
        }
    }
}

/// `"type"` tag of a feature object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
enum FeatureTag {
    #[default]
    Feature,
}

/// `"type"` tag of a feature collection object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    /// Sets a property, creating the property map if needed
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Display text for a property. Missing, `null`, empty, `false` and zero values read as "N/A".
    pub fn property_or_na(&self, key: &str) -> String {
        match self.properties.as_ref().and_then(|p| p.get(key)) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => MISSING_PROPERTY.to_string(),
            Some(Value::String(s)) if s.is_empty() => MISSING_PROPERTY.to_string(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => MISSING_PROPERTY.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn company_name(&self) -> String {
        self.property_or_na(PROP_COMPANY_NAME)
    }

    pub fn entity_type(&self) -> String {
        self.property_or_na(PROP_ENTITY_TYPE)
    }

    pub fn address(&self) -> String {
        self.property_or_na(PROP_ADDRESS)
    }
}

/// Ordered feature collection; order is the list display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
            bbox: None,
        }
    }

    /// Parses a GeoJSON document that must be a `FeatureCollection`
    pub fn from_str(geojson_str: &str) -> Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    /// Serializes back to a GeoJSON document
    pub fn to_geojson_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    {
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"company_name": "Acme", "entity_type": "Factory"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [0, 2], [2, 2], [2, 0], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": {
                    "type": "Point",
                    "coordinates": [-74.0060, 40.7128, 12.5]
                }
            }
        ]
    }
    "#;

    #[test]
    fn test_collection_parsing() {
        let collection = FeatureCollection::from_str(SAMPLE).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].company_name(), "Acme");
        assert_eq!(collection.features[0].geometry.as_ref().unwrap().kind(), "Polygon");
        assert_eq!(
            collection.features[1].geometry,
            Some(Geometry::point(-74.0060, 40.7128))
        );
    }

    #[test]
    fn test_rejects_bare_feature() {
        let feature = r#"{"type": "Feature", "geometry": null, "properties": {}}"#;
        assert!(matches!(
            FeatureCollection::from_str(feature),
            Err(MapError::ParseError(_))
        ));
    }

    #[test]
    fn test_rejects_short_position() {
        let bad = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1]}}
        ]}"#;
        assert!(FeatureCollection::from_str(bad).is_err());
    }

    #[test]
    fn test_missing_properties_read_as_na() {
        let feature = Feature::new(Geometry::point(0.0, 0.0))
            .with_property("entity_type", "")
            .with_property("address", Value::Null);

        assert_eq!(feature.company_name(), "N/A");
        assert_eq!(feature.entity_type(), "N/A");
        assert_eq!(feature.address(), "N/A");
    }

    #[test]
    fn test_non_string_property() {
        let feature = Feature::new(Geometry::point(0.0, 0.0))
            .with_property("company_name", 42)
            .with_property("entity_type", true);
        assert_eq!(feature.company_name(), "42");
        assert_eq!(feature.entity_type(), "true");
    }

    #[test]
    fn test_falsy_properties_read_as_na() {
        let feature = Feature::new(Geometry::point(0.0, 0.0))
            .with_property("company_name", 0)
            .with_property("entity_type", false)
            .with_property("address", 0.0);

        assert_eq!(feature.company_name(), "N/A");
        assert_eq!(feature.entity_type(), "N/A");
        assert_eq!(feature.address(), "N/A");
    }

    #[test]
    fn test_round_trip_keeps_type_tag() {
        let collection = FeatureCollection::from_str(SAMPLE).unwrap();
        let value = collection.to_geojson_value().unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][1]["geometry"]["coordinates"][0], -74.0060);
    }
}
