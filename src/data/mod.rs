pub mod centroid;
pub mod fetch;
pub mod geojson;
pub mod source;
