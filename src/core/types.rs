use serde::{Deserialize, Serialize};

use super::error::{ScoutError, ScoutResult};

/// Column order shared by the all-results and filtered collections.
pub const PLACE_COLUMNS: [&str; 8] = [
    "search_item",
    "search_lat",
    "search_lon",
    "url",
    "url_lat",
    "url_lon",
    "distance_km",
    "within_7km",
];

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> ScoutResult<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ScoutError::InvalidArgument(format!(
                "non-finite coordinate ({}, {})",
                lat, lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ScoutError::InvalidArgument(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ScoutError::InvalidArgument(format!(
                "longitude {} outside [-180, 180]",
                lon
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.lon).is_ok()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// One URL handed over by the browser-driving collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub search_item: String,
    pub search_center: Coordinate,
    pub url: String,
}

impl Candidate {
    pub fn new(
        search_item: impl Into<String>,
        search_center: Coordinate,
        url: impl Into<String>,
    ) -> Self {
        Self {
            search_item: search_item.into(),
            search_center,
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    pub search_item: String,
    pub search_center: Coordinate,
    pub url: String,
    pub place_coordinate: Option<Coordinate>,
    /// Rounded to two decimals.
    pub distance_km: Option<f64>,
    pub within_threshold: bool,
}

impl PlaceRecord {
    /// Record for a URL whose coordinate resolved; `raw_distance_km` is unrounded.
    pub fn resolved(
        candidate: &Candidate,
        place_coordinate: Coordinate,
        raw_distance_km: f64,
        threshold_km: f64,
    ) -> Self {
        Self {
            search_item: candidate.search_item.clone(),
            search_center: candidate.search_center,
            url: candidate.url.clone(),
            place_coordinate: Some(place_coordinate),
            distance_km: Some(round2(raw_distance_km)),
            within_threshold: raw_distance_km <= threshold_km,
        }
    }

    pub fn to_row(&self) -> PlaceRow {
        PlaceRow {
            search_item: self.search_item.clone(),
            search_lat: self.search_center.lat,
            search_lon: self.search_center.lon,
            url: self.url.clone(),
            url_lat: self.place_coordinate.map(|c| c.lat),
            url_lon: self.place_coordinate.map(|c| c.lon),
            distance_km: self.distance_km,
            within_7km: if self.within_threshold { "YES" } else { "NO" }.to_string(),
        }
    }
}

/// On-disk row layout; field order matches [`PLACE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRow {
    pub search_item: String,
    pub search_lat: f64,
    pub search_lon: f64,
    pub url: String,
    pub url_lat: Option<f64>,
    pub url_lon: Option<f64>,
    pub distance_km: Option<f64>,
    pub within_7km: String,
}

/// Business fields pulled from a place-detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub url: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    /// Raw label the rating was parsed from, e.g. `"4.5 stars"`.
    pub rating_text: Option<String>,
    pub operating_hours: Option<String>,
    pub permanently_closed: bool,
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
