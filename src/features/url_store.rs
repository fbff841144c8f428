//! URL deduplication and incremental CSV persistence.
//!
//! Two append-only collections share one column layout: every resolved place
//! goes to the all-results file, and places within the distance threshold are
//! also copied to the filtered file. The `seen` set is seeded from both files
//! on open so repeated runs against the same targets never re-emit a URL.
//!
//! Rows are flushed before [`UrlStore::record`] returns; a crash mid-run loses
//! at most the row being written.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::core::error::{url_prefix, ScoutError, ScoutResult};
use crate::core::types::{PlaceRecord, PlaceRow, PLACE_COLUMNS};

// ─────────────────────────────────────────────────────────────────────────────
// Append-only sink
// ─────────────────────────────────────────────────────────────────────────────

/// One append-only CSV collection. The writer is opened lazily and dropped
/// after a failed write so the next record retries with a fresh handle.
#[derive(Debug)]
struct CsvSink {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvSink {
    fn new(path: PathBuf) -> Self {
        Self { path, writer: None }
    }

    fn open_writer(&self) -> ScoutResult<csv::Writer<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| ScoutError::storage(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(PLACE_COLUMNS)
                .map_err(|e| ScoutError::storage(&self.path, e))?;
            writer
                .flush()
                .map_err(|e| ScoutError::storage(&self.path, e))?;
            info!("Created new CSV file: {}", self.path.display());
        }
        Ok(writer)
    }

    /// Make sure the file exists with a header row.
    fn prepare(&mut self) -> ScoutResult<()> {
        if self.writer.is_none() {
            self.writer = Some(self.open_writer()?);
        }
        Ok(())
    }

    fn append(&mut self, row: &PlaceRow) -> ScoutResult<()> {
        let mut writer = match self.writer.take() {
            Some(w) => w,
            None => self.open_writer()?,
        };
        writer
            .serialize(row)
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        writer
            .flush()
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        self.writer = Some(writer);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Seeding from prior runs
// ─────────────────────────────────────────────────────────────────────────────

/// Result of scanning one collection for previously recorded URLs.
#[derive(Debug)]
pub enum SeedOutcome {
    Missing,
    NoUrlColumn,
    Unreadable(ScoutError),
    Loaded { urls: Vec<String>, skipped_rows: usize },
}

/// Read the `url` column of a collection. Never fails: problems are reported
/// through [`SeedOutcome`] so the caller can log them and carry on.
pub fn read_url_column(path: &Path) -> SeedOutcome {
    if !path.exists() {
        return SeedOutcome::Missing;
    }

    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(e) => return SeedOutcome::Unreadable(ScoutError::storage(path, e)),
    };

    let url_idx = match reader.headers() {
        Ok(h) if h.is_empty() => {
            return SeedOutcome::Loaded {
                urls: Vec::new(),
                skipped_rows: 0,
            }
        }
        Ok(h) => match h.iter().position(|name| name.trim() == "url") {
            Some(i) => i,
            None => return SeedOutcome::NoUrlColumn,
        },
        Err(e) => return SeedOutcome::Unreadable(ScoutError::storage(path, e)),
    };

    let mut urls = Vec::new();
    let mut skipped_rows = 0;
    for result in reader.records() {
        match result {
            Ok(record) => match record.get(url_idx).map(str::trim) {
                Some(url) if !url.is_empty() => urls.push(url.to_string()),
                _ => skipped_rows += 1,
            },
            Err(e) => {
                debug!("skipping unreadable row in {}: {}", path.display(), e);
                skipped_rows += 1;
            }
        }
    }

    SeedOutcome::Loaded { urls, skipped_rows }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct UrlStore {
    seen: HashSet<String>,
    all: CsvSink,
    filtered: CsvSink,
}

impl UrlStore {
    /// Open (or create) both collections and seed `seen` from them.
    ///
    /// Never aborts: a collection that cannot be created, has no `url`
    /// column, or cannot be read is logged and contributes nothing.
    pub fn open(all_path: impl Into<PathBuf>, filtered_path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            seen: HashSet::new(),
            all: CsvSink::new(all_path.into()),
            filtered: CsvSink::new(filtered_path.into()),
        };

        for sink in [&mut store.all, &mut store.filtered] {
            if let Err(e) = sink.prepare() {
                warn!("could not initialize {}: {}", sink.path.display(), e);
            }
        }

        store.reload();
        store
    }

    /// Re-scan both collections and merge their URLs into `seen`.
    ///
    /// Returns how many URLs were new to this store; a second call right
    /// after the first returns 0.
    pub fn reload(&mut self) -> usize {
        let before = self.seen.len();
        let paths = [
            (self.all.path.clone(), "all URLs"),
            (self.filtered.path.clone(), "filtered URLs"),
        ];
        for (path, description) in paths {
            self.seed_from(&path, description);
        }
        let added = self.seen.len() - before;
        info!(
            "Total unique URLs already processed: {} ({} new)",
            self.seen.len(),
            added
        );
        added
    }

    /// Merge the `url` column of any compatible CSV into `seen`.
    pub fn seed_from(&mut self, path: &Path, description: &str) -> usize {
        match read_url_column(path) {
            SeedOutcome::Missing => {
                info!("{} not found - starting without {}", path.display(), description);
                0
            }
            SeedOutcome::NoUrlColumn => {
                warn!("No 'url' column found in {}", path.display());
                0
            }
            SeedOutcome::Unreadable(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                0
            }
            SeedOutcome::Loaded { urls, skipped_rows } => {
                let found = urls.len();
                let before = self.seen.len();
                self.seen.extend(urls);
                if skipped_rows > 0 {
                    warn!(
                        "{}: skipped {} rows without a readable url",
                        path.display(),
                        skipped_rows
                    );
                }
                info!("Loaded {} existing {} from {}", found, description, path.display());
                self.seen.len() - before
            }
        }
    }

    pub fn is_duplicate(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Persist a new place.
    ///
    /// Recording an already-seen URL is rejected with `DuplicateViolation`;
    /// callers filter with [`is_duplicate`](Self::is_duplicate) first. The URL
    /// joins `seen` as soon as its all-results row is on disk, so a failed
    /// filtered write still leaves it deduplicated (a reload would see it too).
    pub fn record(&mut self, place: &PlaceRecord) -> ScoutResult<()> {
        if self.seen.contains(&place.url) {
            return Err(ScoutError::DuplicateViolation {
                url_prefix: url_prefix(&place.url),
            });
        }

        let row = place.to_row();
        self.all.append(&row)?;
        self.seen.insert(place.url.clone());

        if place.within_threshold {
            self.filtered.append(&row)?;
        }
        Ok(())
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn all_path(&self) -> &Path {
        &self.all.path
    }

    pub fn filtered_path(&self) -> &Path {
        &self.filtered.path
    }
}

/// [`UrlStore`] shared between concurrent workers.
///
/// All access goes through one mutex; [`record_if_new`](Self::record_if_new)
/// performs the duplicate check and the write inside a single critical section.
/// Anything that touches the files runs on the blocking pool.
#[derive(Clone, Debug)]
pub struct SharedUrlStore {
    inner: Arc<Mutex<UrlStore>>,
}

fn lock(inner: &Mutex<UrlStore>) -> MutexGuard<'_, UrlStore> {
    // a panic mid-write leaves `seen` consistent with what reached disk
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SharedUrlStore {
    pub fn new(store: UrlStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub async fn is_duplicate(&self, url: &str) -> bool {
        lock(&self.inner).is_duplicate(url)
    }

    /// Record `place` unless another worker got there first.
    ///
    /// `Ok(false)` means the URL was already seen and nothing was written.
    pub async fn record_if_new(&self, place: &PlaceRecord) -> ScoutResult<bool> {
        let inner = Arc::clone(&self.inner);
        let place = place.clone();
        tokio::task::spawn_blocking(move || {
            let mut store = lock(&inner);
            if store.is_duplicate(&place.url) {
                return Ok(false);
            }
            store.record(&place)?;
            Ok(true)
        })
        .await
        .map_err(|e| ScoutError::Task(e.to_string()))?
    }

    pub async fn seen_len(&self) -> usize {
        lock(&self.inner).seen_len()
    }

    pub async fn reload(&self) -> ScoutResult<usize> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || lock(&inner).reload())
            .await
            .map_err(|e| ScoutError::Task(e.to_string()))
    }
}
