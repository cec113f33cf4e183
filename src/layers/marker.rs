use crate::core::constants::POPUP_OFFSET;
use crate::core::geo::LatLng;
use crate::data::centroid::feature_centroid;
use crate::data::geojson::Feature;

/// Popup attached to a marker, opened when the marker is clicked
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Distance in pixels between the marker anchor and the popup
    pub offset: f64,
    pub html: String,
}

impl Popup {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            offset: POPUP_OFFSET,
            html: html.into(),
        }
    }

    /// Company name and entity type of a feature, "N/A" when missing
    pub fn for_feature(feature: &Feature) -> Self {
        Self::new(format!(
            "Company Name: {}<br/>Entity Type: {}<br/>",
            feature.company_name(),
            feature.entity_type()
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    position: LatLng,
    popup: Option<Popup>,
}

impl Marker {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            popup: None,
        }
    }

    pub fn with_popup(mut self, popup: Popup) -> Self {
        self.popup = Some(popup);
        self
    }

    /// Marker at the feature's centroid with its popup; `None` without a usable geometry
    pub fn for_feature(feature: &Feature) -> Option<Self> {
        let position = feature_centroid(feature)?;
        Some(Self::new(position).with_popup(Popup::for_feature(feature)))
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }
}
