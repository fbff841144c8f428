use url::Url;

use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::Coordinate;
use crate::features::search_input::SearchSpec;

pub const MAPS_SEARCH_BASE: &str = "https://www.google.com/maps/search";

/// Search URL centered on `center`, e.g.
/// `https://www.google.com/maps/search/%22Cafe%22/@28.6,77.2,13000m`.
///
/// The quoted term keeps the service from rewriting multi-word queries.
pub fn build_search_url(search_item: &str, center: Coordinate, radius_m: u32) -> ScoutResult<Url> {
    let term = search_item.trim();
    if term.is_empty() {
        return Err(ScoutError::InvalidArgument("empty search item".to_string()));
    }

    let mut url = Url::parse(MAPS_SEARCH_BASE)
        .map_err(|e| ScoutError::Config(format!("bad search base url: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ScoutError::Config("search base url cannot take path segments".to_string()))?
        .push(&format!("\"{}\"", term))
        .push(&format!(
            "@{},{},{}m",
            viewport_degrees(center.lat),
            viewport_degrees(center.lon),
            radius_m
        ));
    Ok(url)
}

/// Decimal degrees that always carry a fractional part (`28` → `28.0`), since
/// the `/@lat,lon` form is only recognized with a decimal point.
fn viewport_degrees(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

pub fn search_urls(searches: &[SearchSpec], radius_m: u32) -> Vec<(String, ScoutResult<Url>)> {
    searches
        .iter()
        .map(|s| {
            (
                s.search_item.clone(),
                build_search_url(&s.search_item, s.center, radius_m),
            )
        })
        .collect()
}
