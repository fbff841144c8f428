//! Coordinate extraction from map-service URLs.
//!
//! Place-detail URLs carry the place position in tile parameters
//! (`!3d<lat>!4d<lon>`); search/listing URLs only carry the viewport center
//! after `/@`. Both shapes reach us from the driver, so both are tried.

use regex::Regex;
use std::sync::OnceLock;

use crate::core::error::{url_prefix, ParseFailureReason, ScoutError, ScoutResult};
use crate::core::types::Coordinate;

static LAT_MARKER: OnceLock<Regex> = OnceLock::new();
static LON_MARKER: OnceLock<Regex> = OnceLock::new();
static VIEWPORT: OnceLock<Regex> = OnceLock::new();

fn lat_marker() -> &'static Regex {
    LAT_MARKER.get_or_init(|| Regex::new(r"3d([+-]?\d+\.?\d*)").expect("static regex"))
}

fn lon_marker() -> &'static Regex {
    LON_MARKER.get_or_init(|| Regex::new(r"4d([+-]?\d+\.?\d*)").expect("static regex"))
}

fn viewport() -> &'static Regex {
    VIEWPORT.get_or_init(|| {
        Regex::new(r"/@([-+]?\d+\.\d+),([-+]?\d+\.\d+)").expect("static regex")
    })
}

/// Which URL shape produced the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    TileMarkers,
    Viewport,
}

/// Extract the coordinate embedded in `url`.
///
/// Tile markers win whenever both are present; the viewport form is only
/// consulted when they are not. A match whose numerals fail to parse or fall
/// outside valid bounds is a failure, not an error for the run.
pub fn extract_coordinates(url: &str) -> ScoutResult<Coordinate> {
    extract_with_source(url).map(|(c, _)| c)
}

pub fn extract_with_source(url: &str) -> ScoutResult<(Coordinate, CoordinateSource)> {
    let fail = |reason| ScoutError::ParseFailure {
        url_prefix: url_prefix(url),
        reason,
    };

    let lat = lat_marker().captures(url).and_then(|c| c.get(1));
    let lon = lon_marker().captures(url).and_then(|c| c.get(1));
    if let (Some(lat), Some(lon)) = (lat, lon) {
        let coord = parse_pair(lat.as_str(), lon.as_str()).map_err(fail)?;
        tracing::debug!("coordinates extracted: {}", coord);
        return Ok((coord, CoordinateSource::TileMarkers));
    }

    if let Some(caps) = viewport().captures(url) {
        let (Some(lat), Some(lon)) = (caps.get(1), caps.get(2)) else {
            return Err(fail(ParseFailureReason::NoCoordinates));
        };
        let coord = parse_pair(lat.as_str(), lon.as_str()).map_err(fail)?;
        tracing::debug!("coordinates extracted (viewport): {}", coord);
        return Ok((coord, CoordinateSource::Viewport));
    }

    Err(fail(ParseFailureReason::NoCoordinates))
}

fn parse_pair(lat_raw: &str, lon_raw: &str) -> Result<Coordinate, ParseFailureReason> {
    let lat: f64 = lat_raw
        .parse()
        .map_err(|_| ParseFailureReason::Malformed(lat_raw.to_string()))?;
    let lon: f64 = lon_raw
        .parse()
        .map_err(|_| ParseFailureReason::Malformed(lon_raw.to_string()))?;
    Coordinate::new(lat, lon).map_err(|_| ParseFailureReason::OutOfRange { lat, lon })
}
