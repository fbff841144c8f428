//! Collaborator seam between whatever drives the map service and the core.
//!
//! The core never launches a browser. A [`CandidateSource`] hands over
//! `(search_item, center, url)` triples, either from a file the driver already
//! wrote or from a saved results page.

pub mod details;
pub mod listing;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::{Candidate, Coordinate};
use crate::features::search_input::{check_columns, validate_coordinates};

#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Short label for log lines.
    fn describe(&self) -> String;

    async fn candidates(&self) -> ScoutResult<Vec<Candidate>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidates CSV: search_item, latitude, longitude, url
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawCandidateRow {
    #[serde(alias = "name")]
    search_item: String,
    #[serde(alias = "search_lat", alias = "lat")]
    latitude: Option<String>,
    #[serde(alias = "search_lon", alias = "lon", alias = "lng")]
    longitude: Option<String>,
    #[serde(alias = "URL")]
    url: Option<String>,
}

const CANDIDATE_COLUMNS: [&str; 4] = ["search_item", "latitude", "longitude", "url"];
const CANDIDATE_ALIASES: &[(&str, &[&str])] = &[
    ("search_item", &["name"]),
    ("latitude", &["search_lat", "lat"]),
    ("longitude", &["search_lon", "lon", "lng"]),
    ("url", &["URL"]),
];

/// Candidates previously captured by a driver into a CSV file.
#[derive(Debug, Clone)]
pub struct CsvCandidateSource {
    path: PathBuf,
}

impl CsvCandidateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(path: &Path, contents: &str) -> ScoutResult<Vec<Candidate>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let headers = reader.headers().map_err(|e| ScoutError::Input {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        check_columns(path, headers, &CANDIDATE_COLUMNS, CANDIDATE_ALIASES)?;

        let mut out = Vec::new();
        for (idx, result) in reader.deserialize::<RawCandidateRow>().enumerate() {
            let line = idx + 2;
            let row = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping row {} of {}: {}", line, path.display(), e);
                    continue;
                }
            };
            let Some(url) = row.url.filter(|u| !u.is_empty()) else {
                warn!("Skipping row {} of {}: empty url", line, path.display());
                continue;
            };
            let Some(center) =
                validate_coordinates(row.latitude.as_deref(), row.longitude.as_deref())
            else {
                warn!(
                    "Skipping '{}' (row {}) - Invalid coordinates: lat={:?}, lon={:?}",
                    row.search_item, line, row.latitude, row.longitude
                );
                continue;
            };
            out.push(Candidate::new(row.search_item, center, url));
        }
        Ok(out)
    }
}

#[async_trait]
impl CandidateSource for CsvCandidateSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn candidates(&self) -> ScoutResult<Vec<Candidate>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ScoutError::Input {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        let candidates = Self::parse(&self.path, &contents)?;
        info!("Loaded {} candidates from {}", candidates.len(), self.path.display());
        Ok(candidates)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Saved results page
// ─────────────────────────────────────────────────────────────────────────────

/// Place links from one saved results page, all attributed to one search.
#[derive(Debug, Clone)]
pub struct HtmlSnapshotSource {
    pub path: PathBuf,
    pub base_url: Url,
    pub search_item: String,
    pub center: Coordinate,
    pub extra_selectors: Vec<String>,
}

#[async_trait]
impl CandidateSource for HtmlSnapshotSource {
    fn describe(&self) -> String {
        format!("html:{} ({})", self.path.display(), self.search_item)
    }

    async fn candidates(&self) -> ScoutResult<Vec<Candidate>> {
        let html = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ScoutError::Input {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        let links = listing::extract_place_links(&html, &self.base_url, &self.extra_selectors);
        info!(
            "Found {} unique place links in {}",
            links.len(),
            self.path.display()
        );
        Ok(links
            .into_iter()
            .map(|url| Candidate::new(self.search_item.clone(), self.center, url))
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Saved detail pages
// ─────────────────────────────────────────────────────────────────────────────

/// Hands over the saved HTML of a place-detail page for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn describe(&self) -> String;

    /// `Ok(None)` when no page was captured for `url`.
    async fn page(&self, url: &str) -> ScoutResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    #[serde(alias = "URL")]
    url: String,
    #[serde(alias = "path", alias = "html")]
    file: String,
}

/// Detail pages a driver saved to disk, indexed by a `url,file` manifest.
/// Relative `file` entries resolve against the manifest's directory.
#[derive(Debug, Clone)]
pub struct SavedPages {
    manifest: PathBuf,
    pages: HashMap<String, PathBuf>,
}

impl SavedPages {
    pub fn from_manifest(path: impl Into<PathBuf>) -> ScoutResult<Self> {
        let manifest = path.into();
        let input_err = |message: String| ScoutError::Input {
            path: manifest.clone(),
            message,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&manifest)
            .map_err(|e| input_err(e.to_string()))?;
        let headers = reader.headers().map_err(|e| input_err(e.to_string()))?;
        check_columns(&manifest, headers, &MANIFEST_COLUMNS, MANIFEST_ALIASES)?;

        let base = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut pages = HashMap::new();
        for (idx, result) in reader.deserialize::<ManifestRow>().enumerate() {
            match result {
                Ok(row) if !row.url.is_empty() && !row.file.is_empty() => {
                    pages.insert(row.url, base.join(row.file));
                }
                Ok(_) => warn!(
                    "Skipping row {} of {}: empty url or file",
                    idx + 2,
                    manifest.display()
                ),
                Err(e) => warn!("Skipping row {} of {}: {}", idx + 2, manifest.display(), e),
            }
        }
        info!("Indexed {} saved pages from {}", pages.len(), manifest.display());
        Ok(Self { manifest, pages })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

const MANIFEST_COLUMNS: [&str; 2] = ["url", "file"];
const MANIFEST_ALIASES: &[(&str, &[&str])] = &[("url", &["URL"]), ("file", &["path", "html"])];

#[async_trait]
impl PageSource for SavedPages {
    fn describe(&self) -> String {
        format!("pages:{}", self.manifest.display())
    }

    async fn page(&self, url: &str) -> ScoutResult<Option<String>> {
        let Some(path) = self.pages.get(url) else {
            return Ok(None);
        };
        tokio::fs::read_to_string(path)
            .await
            .map(Some)
            .map_err(|e| ScoutError::Input {
                path: path.clone(),
                message: e.to_string(),
            })
    }
}
