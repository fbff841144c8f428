//! End-to-end runs over temp directories: candidates in, two CSV collections out.
use std::path::Path;

use place_scout::details::DetailSelectors;
use place_scout::tools::{enrich_collection, ingest_batch, run_source};
use place_scout::url_store::{SharedUrlStore, UrlStore};
use place_scout::{Candidate, Coordinate, CsvCandidateSource, HtmlSnapshotSource, SavedPages};

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

fn header(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.headers().unwrap().iter().map(String::from).collect()
}

#[tokio::test]
async fn test_cafe_run_splits_near_and_far() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let all = dir.path().join("all_scraped_urls.csv");
    let filtered = dir.path().join("filtered_places.csv");
    let input = dir.path().join("candidates.csv");
    std::fs::write(
        &input,
        "search_item,latitude,longitude,url\n\
         Cafe,28.60,77.20,https://www.google.com/maps/place/Near/data=!3d28.609!4d77.20\n\
         Cafe,28.60,77.20,https://www.google.com/maps/place/Far/data=!3d28.681!4d77.20\n\
         Cafe,28.60,77.20,https://www.google.com/maps/place/Nowhere\n",
    )
    .unwrap();

    let store = SharedUrlStore::new(UrlStore::open(&all, &filtered));
    let source = CsvCandidateSource::new(&input);
    let summary = run_source(&source, &store, 7.0, 4).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.recorded, 2);
    assert_eq!(summary.within_threshold, 1);
    assert_eq!(summary.no_coordinates, 1);

    assert_eq!(
        header(&all),
        vec![
            "search_item",
            "search_lat",
            "search_lon",
            "url",
            "url_lat",
            "url_lon",
            "distance_km",
            "within_7km"
        ]
    );

    let all_rows = rows(&all);
    assert_eq!(all_rows.len(), 2);
    let near = all_rows
        .iter()
        .find(|r| r[3].contains("Near"))
        .expect("near row");
    assert_eq!(&near[0], "Cafe");
    assert_eq!(near[6].parse::<f64>().unwrap(), 1.0);
    assert_eq!(&near[7], "YES");
    let far = all_rows
        .iter()
        .find(|r| r[3].contains("Far"))
        .expect("far row");
    assert_eq!(far[6].parse::<f64>().unwrap(), 9.01);
    assert_eq!(&far[7], "NO");

    let filtered_rows = rows(&filtered);
    assert_eq!(filtered_rows.len(), 1);
    assert!(filtered_rows[0][3].contains("Near"));
}

#[tokio::test]
async fn test_second_run_emits_nothing_new() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let all = dir.path().join("all.csv");
    let filtered = dir.path().join("filtered.csv");
    let center = Coordinate::new(28.60, 77.20).unwrap();
    let batch = || {
        vec![
            Candidate::new("Cafe", center, "https://maps.test/place/a!3d28.609!4d77.20"),
            Candidate::new("Cafe", center, "https://maps.test/place/b!3d28.681!4d77.20"),
        ]
    };

    let first = SharedUrlStore::new(UrlStore::open(&all, &filtered));
    let summary = ingest_batch(&first, batch(), 7.0, 2).await;
    assert_eq!(summary.recorded, 2);
    drop(first);

    // a fresh process picks the URLs up from disk
    let second = SharedUrlStore::new(UrlStore::open(&all, &filtered));
    assert_eq!(second.seen_len().await, 2);
    let summary = ingest_batch(&second, batch(), 7.0, 2).await;
    assert_eq!(summary.recorded, 0);
    assert_eq!(summary.duplicates, 2);

    assert_eq!(rows(&all).len(), 2);
    assert_eq!(rows(&filtered).len(), 1);
    // reloading what is already loaded adds nothing
    assert_eq!(second.reload().await.unwrap(), 0);
    assert_eq!(second.seen_len().await, 2);
}

#[tokio::test]
async fn test_seed_from_hand_written_collections() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let all = dir.path().join("all.csv");
    let filtered = dir.path().join("filtered.csv");
    std::fs::write(
        &all,
        "search_item,url,distance_km\n\
         Gym,https://example.com/place1,1.5\n\
         Gym,https://example.com/place2,9.0\n\
         Gym,https://example.com/place1,1.5\n",
    )
    .unwrap();
    std::fs::write(&filtered, "name,link\nGym,https://example.com/place3\n").unwrap();

    let mut store = UrlStore::open(&all, &filtered);
    // filtered file has no url column and contributes nothing
    assert_eq!(store.seen_len(), 2);
    assert!(store.is_duplicate("https://example.com/place1"));
    assert!(!store.is_duplicate("https://example.com/place3"));
    assert_eq!(store.reload(), 0);
}

#[tokio::test]
async fn test_listing_snapshot_ingest() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("results.html");
    std::fs::write(
        &page,
        r#"<html><body><div role="feed">
             <a class="hfpxzc" href="/maps/place/Near/data=!3d28.609!4d77.20">Near</a>
             <a class="hfpxzc" href="/maps/place/Far/data=!3d28.681!4d77.20">Far</a>
             <a class="hfpxzc" href="/maps/place/Near/data=!3d28.609!4d77.20">Near again</a>
           </div></body></html>"#,
    )
    .unwrap();

    let store = SharedUrlStore::new(UrlStore::open(
        dir.path().join("all.csv"),
        dir.path().join("filtered.csv"),
    ));
    let source = HtmlSnapshotSource {
        path: page,
        base_url: url::Url::parse("https://www.google.com/maps/").unwrap(),
        search_item: "Cafe".to_string(),
        center: Coordinate::new(28.60, 77.20).unwrap(),
        extra_selectors: Vec::new(),
    };
    let summary = run_source(&source, &store, 7.0, 2).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.recorded, 2);
    assert_eq!(summary.within_threshold, 1);
    assert_eq!(rows(&dir.path().join("filtered.csv")).len(), 1);
}

#[tokio::test]
async fn test_missing_candidates_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SharedUrlStore::new(UrlStore::open(
        dir.path().join("all.csv"),
        dir.path().join("filtered.csv"),
    ));
    let source = CsvCandidateSource::new(dir.path().join("missing.csv"));
    assert!(run_source(&source, &store, 7.0, 2).await.is_err());
}

#[tokio::test]
async fn test_enrich_filtered_collection_from_saved_pages() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let all = dir.path().join("all.csv");
    let filtered = dir.path().join("filtered.csv");
    let center = Coordinate::new(28.60, 77.20).unwrap();
    let near = "https://maps.test/place/near!3d28.609!4d77.20";
    let near_too = "https://maps.test/place/near-too!3d28.61!4d77.20";

    let store = SharedUrlStore::new(UrlStore::open(&all, &filtered));
    let candidates = vec![
        Candidate::new("Cafe", center, near),
        Candidate::new("Cafe", center, near_too),
    ];
    assert_eq!(ingest_batch(&store, candidates, 7.0, 2).await.within_threshold, 2);

    std::fs::write(
        dir.path().join("near.html"),
        "<html><body><h1 class='DUwDvf'>Near Cafe</h1>\
         <div role='img' aria-label='4,3 stars'></div>\
         <span>Permanently closed</span></body></html>",
    )
    .unwrap();
    let manifest = dir.path().join("pages.csv");
    std::fs::write(&manifest, format!("url,file\n{},near.html\n", near)).unwrap();

    let pages = SavedPages::from_manifest(&manifest).unwrap();
    let output = dir.path().join("filtered_output.csv");
    let summary = enrich_collection(&filtered, &output, &pages, &DetailSelectors::default(), 5)
        .await
        .unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.enriched, 1);
    assert_eq!(summary.missing_pages, 1);

    let head = header(&output);
    assert_eq!(head.len(), 15);
    assert_eq!(head[3], "url");
    assert_eq!(head[8], "Name");
    assert_eq!(head[14], "Permanently_Closed");

    let out_rows = rows(&output);
    let enriched = out_rows.iter().find(|r| &r[3] == near).unwrap();
    assert_eq!(&enriched[7], "YES");
    assert_eq!(&enriched[8], "Near Cafe");
    assert_eq!(&enriched[12], "4.3");
    assert_eq!(&enriched[14], "YES");
    let bare = out_rows.iter().find(|r| &r[3] == near_too).unwrap();
    assert_eq!(&bare[8], "");
}
