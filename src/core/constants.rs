//! Engine-wide names and defaults.
//! Source and layer ids are matched by external styling, so they must stay byte-for-byte stable.

/// GeoJSON source holding the whole feature collection.
pub const SOURCE_ID: &str = "company-locations";

/// Outline layer drawn from [`SOURCE_ID`].
pub const LINE_LAYER_ID: &str = "company-locations-layer";

/// Fill layer drawn from [`SOURCE_ID`].
pub const FILL_LAYER_ID: &str = "company-locations-fill-layer";

/// Basemap style used when none is configured.
pub const DEFAULT_STYLE_URL: &str =
    "https://raw.githubusercontent.com/go2garret/maps/main/src/assets/json/openStreetMap.json";

/// Mount target id used when none is configured.
pub const DEFAULT_CONTAINER: &str = "map";

/// Initial zoom when none is configured.
pub const DEFAULT_ZOOM: f64 = 2.0;

/// Camera zoom reached by the focus operation.
pub const FOCUS_ZOOM: f64 = 15.0;

/// Duration of the focus fly-to, in milliseconds.
pub const FOCUS_DURATION_MS: u64 = 1500;

/// Default feature collection endpoint.
pub const DEFAULT_DATA_URL: &str = "http://localhost:8000/api/geodata";

/// Pixel offset between a marker and its popup.
pub const POPUP_OFFSET: f64 = 25.0;

/// Text shown for any missing feature property.
pub const MISSING_PROPERTY: &str = "N/A";

/// Property keys read from each feature.
pub const PROP_COMPANY_NAME: &str = "company_name";
pub const PROP_ENTITY_TYPE: &str = "entity_type";
pub const PROP_ADDRESS: &str = "address";
