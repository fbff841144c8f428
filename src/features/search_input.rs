//! Search list loading: `search_item, latitude, longitude` rows.
//!
//! Missing columns or an unreadable file stop the run; a row whose
//! coordinates do not validate is skipped with a warning.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::Coordinate;

pub const REQUIRED_COLUMNS: [&str; 3] = ["search_item", "latitude", "longitude"];

#[derive(Debug, Deserialize)]
struct RawSearchRow {
    #[serde(alias = "Search Item", alias = "name", alias = "query")]
    search_item: String,
    #[serde(alias = "lat", alias = "Latitude")]
    latitude: Option<String>,
    #[serde(alias = "lon", alias = "lng", alias = "Longitude")]
    longitude: Option<String>,
}

/// One validated search: a query and the center distances are measured from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    pub search_item: String,
    pub center: Coordinate,
}

/// Parse a pair of raw cells into a coordinate; blank, non-numeric, or
/// out-of-range cells yield `None`.
pub fn validate_coordinates(lat: Option<&str>, lon: Option<&str>) -> Option<Coordinate> {
    let lat: f64 = lat?.trim().parse().ok()?;
    let lon: f64 = lon?.trim().parse().ok()?;
    Coordinate::new(lat, lon).ok()
}

pub(crate) fn check_columns(
    path: &Path,
    headers: &csv::StringRecord,
    required: &[&str],
    aliases: &[(&str, &[&str])],
) -> ScoutResult<()> {
    let present: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| {
            let alts = aliases
                .iter()
                .find(|(name, _)| name == col)
                .map(|(_, alts)| *alts)
                .unwrap_or(&[]);
            !present.iter().any(|h| h == col || alts.contains(&h.as_str()))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScoutError::Config(format!(
            "{}: missing required columns: {:?}",
            path.display(),
            missing
        )))
    }
}

const SEARCH_ALIASES: &[(&str, &[&str])] = &[
    ("search_item", &["Search Item", "name", "query"]),
    ("latitude", &["lat", "Latitude"]),
    ("longitude", &["lon", "lng", "Longitude"]),
];

pub fn load_searches(path: impl AsRef<Path>) -> ScoutResult<Vec<SearchSpec>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScoutError::Input {
            path: path.to_path_buf(),
            message: "input file not found".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ScoutError::Input {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let headers = reader.headers().map_err(|e| ScoutError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    check_columns(path, headers, &REQUIRED_COLUMNS, SEARCH_ALIASES)?;

    let mut searches = Vec::new();
    for (idx, result) in reader.deserialize::<RawSearchRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping row {} of {}: {}", idx + 2, path.display(), e);
                continue;
            }
        };
        if row.search_item.trim().is_empty() {
            warn!("Skipping row {} of {}: empty search_item", idx + 2, path.display());
            continue;
        }
        match validate_coordinates(row.latitude.as_deref(), row.longitude.as_deref()) {
            Some(center) => searches.push(SearchSpec {
                search_item: row.search_item,
                center,
            }),
            None => warn!(
                "Skipping '{}' - Invalid coordinates: lat={:?}, lon={:?}",
                row.search_item, row.latitude, row.longitude
            ),
        }
    }

    info!("Loaded {} searches from {}", searches.len(), path.display());
    Ok(searches)
}
