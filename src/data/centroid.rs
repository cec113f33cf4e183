//! Representative points for feature geometries.
//!
//! Marker placement and camera focus both go through [`centroid_of`], so a
//! marker always sits where the camera flies to.

use crate::core::geo::LatLng;
use crate::data::geojson::{Feature, Geometry};
use geo::Centroid;

/// Centroid of a geometry in `(lng, lat)` space.
///
/// Points map to themselves. Lines and polygons use the length- and
/// area-weighted centroid from the `geo` crate. Returns `None` for empty
/// geometries.
pub fn centroid_of(geometry: &Geometry) -> Option<LatLng> {
    if let Geometry::Point { coordinates } = geometry {
        return Some((*coordinates).into());
    }

    geo_types::Geometry::from(geometry)
        .centroid()
        .map(LatLng::from)
}

/// Centroid of a feature's geometry, `None` when it has none
pub fn feature_centroid(feature: &Feature) -> Option<LatLng> {
    feature.geometry.as_ref().and_then(centroid_of)
}
