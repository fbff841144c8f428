use tracing::{debug, info, warn};

use crate::core::error::{url_prefix, ScoutError, ScoutResult};
use crate::core::types::{Candidate, PlaceRecord};
use crate::features::url_store::{SharedUrlStore, UrlStore};
use crate::geo::{extract_coordinates, haversine_km};

/// Extract the place coordinate and measure it against the search center.
/// Touches no shared state.
pub fn resolve_candidate(candidate: &Candidate, threshold_km: f64) -> ScoutResult<PlaceRecord> {
    let place = extract_coordinates(&candidate.url)?;
    let distance = haversine_km(candidate.search_center, place)?;
    Ok(PlaceRecord::resolved(candidate, place, distance, threshold_km))
}

fn duplicate(candidate: &Candidate) -> ScoutError {
    ScoutError::DuplicateViolation {
        url_prefix: url_prefix(&candidate.url),
    }
}

/// Log a per-candidate failure at a level matching its class.
pub fn log_failure(candidate: &Candidate, err: &ScoutError) {
    match err {
        ScoutError::DuplicateViolation { url_prefix } => debug!(
            search_item = %candidate.search_item,
            "Skipping duplicate URL: {}",
            url_prefix
        ),
        ScoutError::ParseFailure { url_prefix, reason } => warn!(
            search_item = %candidate.search_item,
            "Skipping URL - {}: {}",
            reason,
            url_prefix
        ),
        other => warn!(
            search_item = %candidate.search_item,
            url = %url_prefix(&candidate.url),
            "Candidate failed: {}",
            other
        ),
    }
}

fn log_recorded(record: &PlaceRecord) {
    info!(
        search_item = %record.search_item,
        "Processed URL: {} Distance: {} km Within threshold: {}",
        url_prefix(&record.url),
        record.distance_km.unwrap_or_default(),
        if record.within_threshold { "YES" } else { "NO" }
    );
}

fn ingest_exclusive(
    store: &mut UrlStore,
    candidate: &Candidate,
    threshold_km: f64,
) -> ScoutResult<PlaceRecord> {
    if store.is_duplicate(&candidate.url) {
        return Err(duplicate(candidate));
    }
    let record = resolve_candidate(candidate, threshold_km)?;
    store.record(&record)?;
    Ok(record)
}

/// Run one candidate through extract → distance → store on an exclusively
/// owned store. Duplicates are rejected before any parsing happens.
pub fn ingest_candidate(
    store: &mut UrlStore,
    candidate: &Candidate,
    threshold_km: f64,
) -> ScoutResult<PlaceRecord> {
    let result = ingest_exclusive(store, candidate, threshold_km);
    match &result {
        Ok(record) => log_recorded(record),
        Err(e) => log_failure(candidate, e),
    }
    result
}

async fn ingest_locked(
    store: &SharedUrlStore,
    candidate: &Candidate,
    threshold_km: f64,
) -> ScoutResult<PlaceRecord> {
    if store.is_duplicate(&candidate.url).await {
        return Err(duplicate(candidate));
    }
    let record = resolve_candidate(candidate, threshold_km)?;
    if !store.record_if_new(&record).await? {
        return Err(duplicate(candidate));
    }
    Ok(record)
}

/// Same pipeline against a store shared between workers.
///
/// The early duplicate check only saves parsing work; the authoritative check
/// happens atomically with the write in [`SharedUrlStore::record_if_new`].
pub async fn ingest_shared(
    store: &SharedUrlStore,
    candidate: &Candidate,
    threshold_km: f64,
) -> ScoutResult<PlaceRecord> {
    let result = ingest_locked(store, candidate, threshold_km).await;
    match &result {
        Ok(record) => log_recorded(record),
        Err(e) => log_failure(candidate, e),
    }
    result
}
