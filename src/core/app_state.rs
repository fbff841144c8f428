use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::ScoutConfig;
use crate::features::url_store::{SharedUrlStore, UrlStore};

/// Per-run overrides taken from the command line. `None` keeps the value
/// resolved from the config file / environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub all_urls_path: Option<PathBuf>,
    pub filtered_path: Option<PathBuf>,
    pub threshold_km: Option<f64>,
    pub concurrency: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    /// File-based config loaded from `place-scout.json` (env-var fallback for all fields).
    pub config: Arc<ScoutConfig>,
    pub store: SharedUrlStore,
    pub threshold_km: f64,
    // Bound on in-flight candidates during batch ingest
    pub concurrency: usize,
    pub all_urls_path: PathBuf,
    pub filtered_path: PathBuf,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("threshold_km", &self.threshold_km)
            .field("concurrency", &self.concurrency)
            .field("all_urls_path", &self.all_urls_path)
            .field("filtered_path", &self.filtered_path)
            .finish()
    }
}

impl AppState {
    /// Resolve settings and open the URL store. Opening never fails; unreadable
    /// collections are logged and treated as empty.
    pub fn new(config: ScoutConfig, overrides: Overrides) -> Self {
        let threshold_km = overrides
            .threshold_km
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or_else(|| config.resolve_threshold_km());
        let concurrency = overrides
            .concurrency
            .map(|c| c.max(1))
            .unwrap_or_else(|| config.resolve_concurrency());
        let all_urls_path = overrides
            .all_urls_path
            .unwrap_or_else(|| config.resolve_all_urls_path());
        let filtered_path = overrides
            .filtered_path
            .unwrap_or_else(|| config.resolve_filtered_path());

        let store = SharedUrlStore::new(UrlStore::open(&all_urls_path, &filtered_path));

        Self {
            config: Arc::new(config),
            store,
            threshold_km,
            concurrency,
            all_urls_path,
            filtered_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScoutConfig {
            threshold_km: Some(3.0),
            concurrency: Some(8),
            ..Default::default()
        };
        let state = AppState::new(
            config,
            Overrides {
                all_urls_path: Some(dir.path().join("all.csv")),
                filtered_path: Some(dir.path().join("near.csv")),
                threshold_km: Some(12.5),
                concurrency: Some(0),
            },
        );
        assert_eq!(state.threshold_km, 12.5);
        assert_eq!(state.concurrency, 1);
        assert!(state.all_urls_path.ends_with("all.csv"));
        // both collections exist with a header after open
        assert!(dir.path().join("near.csv").exists());
    }

    #[test]
    fn test_invalid_threshold_override_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScoutConfig {
            threshold_km: Some(4.0),
            ..Default::default()
        };
        let state = AppState::new(
            config,
            Overrides {
                all_urls_path: Some(dir.path().join("a.csv")),
                filtered_path: Some(dir.path().join("f.csv")),
                threshold_km: Some(-1.0),
                concurrency: None,
            },
        );
        assert_eq!(state.threshold_km, 4.0);
    }
}
