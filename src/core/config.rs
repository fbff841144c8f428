use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (place-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "PLACE_SCOUT_CONFIG";
pub const ENV_THRESHOLD_KM: &str = "PLACE_SCOUT_THRESHOLD_KM";
pub const ENV_ALL_URLS: &str = "PLACE_SCOUT_ALL_URLS";
pub const ENV_FILTERED: &str = "PLACE_SCOUT_FILTERED";
pub const ENV_CONCURRENCY: &str = "PLACE_SCOUT_CONCURRENCY";
pub const ENV_SEARCH_RADIUS_M: &str = "PLACE_SCOUT_SEARCH_RADIUS_M";
pub const ENV_DETAILS_OUT: &str = "PLACE_SCOUT_DETAILS_OUT";
pub const ENV_ENRICHED_OUT: &str = "PLACE_SCOUT_ENRICHED_OUT";

pub const DEFAULT_THRESHOLD_KM: f64 = 7.0;
pub const DEFAULT_ALL_URLS: &str = "all_scraped_urls.csv";
pub const DEFAULT_FILTERED: &str = "filtered_places.csv";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 13_000;
pub const DEFAULT_DETAILS_OUT: &str = "place_details.csv";
pub const DEFAULT_ENRICHED_OUT: &str = "filtered_output.csv";

/// Top-level config loaded from `place-scout.json`.
///
/// Every field is optional; the `resolve_*` accessors fall back to an env var
/// and then to the built-in default.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ScoutConfig {
    /// Distance cut-off for the filtered collection. Default: 7 km.
    pub threshold_km: Option<f64>,
    /// Path of the all-results CSV.
    pub all_urls_path: Option<String>,
    /// Path of the within-threshold CSV.
    pub filtered_path: Option<String>,
    /// In-flight candidates during batch ingest. Default: 5.
    pub concurrency: Option<usize>,
    /// Viewport radius baked into generated search URLs. Default: 13000 m.
    pub search_radius_m: Option<u32>,
    pub details_out_path: Option<String>,
    /// Output of the batch details run: input columns plus detail columns.
    pub enriched_out_path: Option<String>,
    /// Extra CSS selectors tried before the built-in place-link list.
    #[serde(default)]
    pub place_link_selectors: Vec<String>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn nonempty(v: &Option<String>) -> Option<String> {
    v.as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ScoutConfig {
    /// Threshold: JSON field → `PLACE_SCOUT_THRESHOLD_KM` → 7.0.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn resolve_threshold_km(&self) -> f64 {
        self.threshold_km
            .or_else(|| env_nonempty(ENV_THRESHOLD_KM).and_then(|v| v.parse().ok()))
            .filter(|v: &f64| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_THRESHOLD_KM)
    }

    /// All-results path: JSON field → `PLACE_SCOUT_ALL_URLS` → `all_scraped_urls.csv`.
    pub fn resolve_all_urls_path(&self) -> PathBuf {
        nonempty(&self.all_urls_path)
            .or_else(|| env_nonempty(ENV_ALL_URLS))
            .unwrap_or_else(|| DEFAULT_ALL_URLS.to_string())
            .into()
    }

    /// Filtered path: JSON field → `PLACE_SCOUT_FILTERED` → `filtered_places.csv`.
    pub fn resolve_filtered_path(&self) -> PathBuf {
        nonempty(&self.filtered_path)
            .or_else(|| env_nonempty(ENV_FILTERED))
            .unwrap_or_else(|| DEFAULT_FILTERED.to_string())
            .into()
    }

    /// Concurrency: JSON field → `PLACE_SCOUT_CONCURRENCY` → 5. Never below 1.
    pub fn resolve_concurrency(&self) -> usize {
        self.concurrency
            .or_else(|| env_nonempty(ENV_CONCURRENCY).and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1)
    }

    pub fn resolve_search_radius_m(&self) -> u32 {
        self.search_radius_m
            .or_else(|| env_nonempty(ENV_SEARCH_RADIUS_M).and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_SEARCH_RADIUS_M)
    }

    pub fn resolve_details_out_path(&self) -> PathBuf {
        nonempty(&self.details_out_path)
            .or_else(|| env_nonempty(ENV_DETAILS_OUT))
            .unwrap_or_else(|| DEFAULT_DETAILS_OUT.to_string())
            .into()
    }

    pub fn resolve_enriched_out_path(&self) -> PathBuf {
        nonempty(&self.enriched_out_path)
            .or_else(|| env_nonempty(ENV_ENRICHED_OUT))
            .unwrap_or_else(|| DEFAULT_ENRICHED_OUT.to_string())
            .into()
    }
}

/// Load `place-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `explicit` (the `--config` flag)
/// 2. `PLACE_SCOUT_CONFIG` env var path
/// 3. `./place-scout.json`
/// 4. `~/.place-scout/config.json`
///
/// Missing file → `ScoutConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config(explicit: Option<&Path>) -> ScoutConfig {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = explicit {
        candidates.push(p.to_path_buf());
    }
    if let Some(env_path) = env_nonempty(ENV_CONFIG_PATH) {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from("place-scout.json"));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".place-scout").join("config.json"));
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => return parse_config(&contents, path),
            Err(_) => continue, // not at this path, try next
        }
    }

    if let Some(p) = explicit {
        tracing::warn!("config file {} not found, using defaults", p.display());
    }
    ScoutConfig::default()
}

fn parse_config(contents: &str, path: &Path) -> ScoutConfig {
    match serde_json::from_str::<ScoutConfig>(contents) {
        Ok(cfg) => {
            tracing::info!("place-scout config loaded from {}", path.display());
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "place-scout config parse error at {}: {}, using defaults",
                path.display(),
                e
            );
            ScoutConfig::default()
        }
    }
}
