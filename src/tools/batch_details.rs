use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::error::{url_prefix, ScoutError, ScoutResult};
use crate::core::types::PlaceDetails;
use crate::features::details_store::{detail_cells, EnrichedWriter};
use crate::scraping::details::{parse_place_details, DetailSelectors};
use crate::scraping::PageSource;

/// Completed rows are written out in chunks of this size.
pub const SAVE_EVERY: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichSummary {
    pub total: usize,
    pub enriched: usize,
    pub missing_pages: usize,
    pub unreadable_pages: usize,
    pub written: usize,
    pub total_duration_ms: u64,
}

/// Input collection: its header plus raw rows.
struct InputCollection {
    headers: Vec<String>,
    url_idx: usize,
    rows: Vec<Vec<String>>,
}

fn read_input(path: &Path) -> ScoutResult<InputCollection> {
    let input_err = |message: String| ScoutError::Input {
        path: path.to_path_buf(),
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| input_err(e.to_string()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| input_err(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let url_idx = headers
        .iter()
        .position(|h| h == "url" || h == "URL")
        .ok_or_else(|| {
            ScoutError::Config(format!(
                "{}: missing required columns: [\"url\"]",
                path.display()
            ))
        })?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                // pad or cut so every output row lines up with the header
                let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                row.resize(headers.len(), String::new());
                rows.push(row);
            }
            Err(e) => warn!("Skipping row {} of {}: {}", idx + 2, path.display(), e),
        }
    }
    Ok(InputCollection {
        headers,
        url_idx,
        rows,
    })
}

enum PageOutcome {
    Parsed(PlaceDetails),
    Missing,
    Unreadable,
}

async fn fetch_details(
    pages: &dyn PageSource,
    url: &str,
    selectors: &DetailSelectors,
) -> PageOutcome {
    if url.is_empty() {
        return PageOutcome::Missing;
    }
    match pages.page(url).await {
        Ok(Some(html)) => {
            let details = parse_place_details(&html, url, selectors);
            debug!("Parsed details for {}", url_prefix(url));
            PageOutcome::Parsed(details)
        }
        Ok(None) => {
            warn!("No saved page for {}", url_prefix(url));
            PageOutcome::Missing
        }
        Err(e) => {
            warn!("Error reading page for {}: {}", url_prefix(url), e);
            PageOutcome::Unreadable
        }
    }
}

/// Append place details to every row of `input` and write the result to
/// `output`.
///
/// Input columns are kept as-is and followed by the detail columns. Rows
/// without a usable page keep empty detail cells. Completed rows are flushed
/// every [`SAVE_EVERY`] rows; only input and output failures end the run.
pub async fn enrich_collection(
    input: &Path,
    output: &Path,
    pages: &dyn PageSource,
    selectors: &DetailSelectors,
    max_concurrent: usize,
) -> ScoutResult<EnrichSummary> {
    let start_time = Instant::now();
    let collection = read_input(input)?;
    let writer = EnrichedWriter::new(output, &collection.headers);
    let url_idx = collection.url_idx;

    let mut summary = EnrichSummary {
        total: collection.rows.len(),
        ..Default::default()
    };
    info!(
        "Starting details for {} rows from {} using {} (concurrency: {})",
        summary.total,
        input.display(),
        pages.describe(),
        max_concurrent
    );

    let mut results = stream::iter(collection.rows)
        .map(|row| async move {
            let url = row[url_idx].trim().to_string();
            let outcome = fetch_details(pages, &url, selectors).await;
            (row, outcome)
        })
        .buffer_unordered(max_concurrent.max(1));

    let mut pending: Vec<Vec<String>> = Vec::with_capacity(SAVE_EVERY);
    while let Some((mut row, outcome)) = results.next().await {
        let details = match outcome {
            PageOutcome::Parsed(d) => {
                summary.enriched += 1;
                Some(d)
            }
            PageOutcome::Missing => {
                summary.missing_pages += 1;
                None
            }
            PageOutcome::Unreadable => {
                summary.unreadable_pages += 1;
                None
            }
        };
        row.extend(detail_cells(details.as_ref()));
        pending.push(row);

        if pending.len() >= SAVE_EVERY {
            summary.written += writer.append(&pending)?;
            pending.clear();
            debug!("Saved {} rows to {}", summary.written, writer.path().display());
        }
    }
    summary.written += writer.append(&pending)?;

    summary.total_duration_ms = start_time.elapsed().as_millis() as u64;
    info!(
        "Details completed: {}/{} enriched, {} without page, {} unreadable, {} rows written to {}, {}ms total",
        summary.enriched,
        summary.total,
        summary.missing_pages,
        summary.unreadable_pages,
        summary.written,
        writer.path().display(),
        summary.total_duration_ms
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct InMemoryPages(HashMap<String, String>);

    #[async_trait]
    impl PageSource for InMemoryPages {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        async fn page(&self, url: &str) -> ScoutResult<Option<String>> {
            if url.ends_with("broken") {
                return Err(ScoutError::Input {
                    path: url.into(),
                    message: "gone".into(),
                });
            }
            Ok(self.0.get(url).cloned())
        }
    }

    fn page(name: &str) -> String {
        format!(
            "<html><body><h1 class='DUwDvf'>{}</h1>\
             <button data-item-id='phone:tel:01123456789'>011 2345 6789</button></body></html>",
            name
        )
    }

    #[tokio::test]
    async fn test_enrich_keeps_input_columns_and_saves_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("filtered_places.csv");
        let output = dir.path().join("filtered_output.csv");

        let mut csv_text = String::from("search_item,url,distance_km\n");
        let mut map = HashMap::new();
        for i in 0..12 {
            let url = format!("https://maps.test/place/{}", i);
            csv_text.push_str(&format!("Cafe,{},1.{}\n", url, i));
            if i % 4 != 3 {
                map.insert(url, page(&format!("Cafe {}", i)));
            }
        }
        csv_text.push_str("Cafe,https://maps.test/place/broken,2.0\n");
        std::fs::write(&input, csv_text).unwrap();

        let pages = InMemoryPages(map);
        let summary = enrich_collection(&input, &output, &pages, &DetailSelectors::default(), 5)
            .await
            .unwrap();

        assert_eq!(summary.total, 13);
        assert_eq!(summary.enriched, 9);
        assert_eq!(summary.missing_pages, 3);
        assert_eq!(summary.unreadable_pages, 1);
        assert_eq!(summary.written, 13);

        let mut reader = csv::Reader::from_path(&output).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(&header[..3], &["search_item", "url", "distance_km"]);
        assert_eq!(header[3], "Name");
        assert_eq!(header.len(), 10);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 13);
        let first = rows
            .iter()
            .find(|r| &r[1] == "https://maps.test/place/0")
            .unwrap();
        assert_eq!(&first[2], "1.0");
        assert_eq!(&first[3], "Cafe 0");
        assert_eq!(&first[6], "01123456789");
        assert_eq!(&first[9], "NO");
        let missing = rows
            .iter()
            .find(|r| &r[1] == "https://maps.test/place/3")
            .unwrap();
        assert_eq!(&missing[3], "");
        assert_eq!(&missing[9], "");
    }

    #[tokio::test]
    async fn test_enrich_requires_url_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "name,link\nA,b\n").unwrap();
        let pages = InMemoryPages(HashMap::new());
        let err = enrich_collection(
            &input,
            &dir.path().join("out.csv"),
            &pages,
            &DetailSelectors::default(),
            2,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
        assert!(!dir.path().join("out.csv").exists());
    }
}
