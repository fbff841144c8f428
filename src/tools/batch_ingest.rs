use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::Candidate;
use crate::features::url_store::SharedUrlStore;
use crate::scraping::CandidateSource;
use crate::tools::ingest::ingest_shared;

/// Per-search tallies.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ItemTally {
    pub recorded: usize,
    pub within_threshold: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub total: usize,
    pub recorded: usize,
    pub within_threshold: usize,
    pub duplicates: usize,
    pub no_coordinates: usize,
    pub invalid: usize,
    pub storage_failures: usize,
    pub total_duration_ms: u64,
    pub per_item: BTreeMap<String, ItemTally>,
}

impl IngestSummary {
    pub fn failed(&self) -> usize {
        self.no_coordinates + self.invalid + self.storage_failures
    }

    /// Share of recorded places that fell within the threshold, in percent.
    pub fn filter_ratio(&self) -> Option<f64> {
        (self.recorded > 0).then(|| self.within_threshold as f64 / self.recorded as f64 * 100.0)
    }

    pub fn log(&self) {
        for (item, tally) in &self.per_item {
            info!(
                "'{}': {} places within threshold (out of {} total NEW places)",
                item, tally.within_threshold, tally.recorded
            );
        }
        info!(
            "Ingest completed: {}/{} recorded, {} within threshold, {} duplicates, {} failed, {}ms total",
            self.recorded,
            self.total,
            self.within_threshold,
            self.duplicates,
            self.failed(),
            self.total_duration_ms
        );
        if let Some(ratio) = self.filter_ratio() {
            info!("Filtering efficiency: {:.1}%", ratio);
        }
        if self.total > 0 && self.recorded == 0 && self.duplicates < self.total {
            warn!("No new places were recorded; check that candidate URLs still embed coordinates");
        } else if self.recorded > 0 && self.within_threshold == 0 {
            warn!("No places within threshold; check the search centers or raise the threshold");
        }
    }
}

/// Ingest candidates concurrently against one shared store.
///
/// Per-candidate failures are counted, never propagated: one bad URL must
/// not stop the rest of the batch.
pub async fn ingest_batch(
    store: &SharedUrlStore,
    candidates: Vec<Candidate>,
    threshold_km: f64,
    max_concurrent: usize,
) -> IngestSummary {
    let start_time = Instant::now();
    let total = candidates.len();

    info!(
        "Starting ingest of {} candidates (concurrency: {}, threshold: {} km)",
        total, max_concurrent, threshold_km
    );

    let results: Vec<(String, ScoutResult<bool>)> = stream::iter(candidates)
        .map(|candidate| {
            let store = store.clone();
            async move {
                let outcome = ingest_shared(&store, &candidate, threshold_km)
                    .await
                    .map(|rec| rec.within_threshold);
                (candidate.search_item, outcome)
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut summary = IngestSummary {
        total,
        ..Default::default()
    };
    for (item, outcome) in results {
        match outcome {
            Ok(within) => {
                summary.recorded += 1;
                let tally = summary.per_item.entry(item).or_default();
                tally.recorded += 1;
                if within {
                    summary.within_threshold += 1;
                    tally.within_threshold += 1;
                }
            }
            Err(ScoutError::DuplicateViolation { .. }) => summary.duplicates += 1,
            Err(ScoutError::ParseFailure { .. }) => summary.no_coordinates += 1,
            Err(ScoutError::Storage { .. }) => summary.storage_failures += 1,
            Err(_) => summary.invalid += 1,
        }
    }
    summary.total_duration_ms = start_time.elapsed().as_millis() as u64;
    summary
}

/// Pull every candidate from `source` and ingest them.
///
/// Only a failure to obtain the candidates (unreadable input, missing
/// columns) is returned as an error.
pub async fn run_source(
    source: &dyn CandidateSource,
    store: &SharedUrlStore,
    threshold_km: f64,
    max_concurrent: usize,
) -> ScoutResult<IngestSummary> {
    info!("Reading candidates from {}", source.describe());
    let candidates = source.candidates().await?;
    let summary = ingest_batch(store, candidates, threshold_km, max_concurrent).await;
    summary.log();
    Ok(summary)
}
