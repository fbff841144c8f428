use std::path::PathBuf;
use thiserror::Error;

/// Why a URL did not yield a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailureReason {
    /// Neither the `3d`/`4d` tile markers nor a `/@lat,lon` viewport were present.
    NoCoordinates,
    /// A marker matched but its numeral did not parse as a float.
    Malformed(String),
    /// The numerals parsed but fall outside latitude/longitude bounds.
    OutOfRange { lat: f64, lon: f64 },
}

impl std::fmt::Display for ParseFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailureReason::NoCoordinates => write!(f, "no coordinates in url"),
            ParseFailureReason::Malformed(raw) => write!(f, "malformed numeral '{}'", raw),
            ParseFailureReason::OutOfRange { lat, lon } => {
                write!(f, "coordinate out of range ({}, {})", lat, lon)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("no coordinate for {url_prefix}: {reason}")]
    ParseFailure {
        url_prefix: String,
        reason: ParseFailureReason,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage failure on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("url already recorded: {url_prefix}")]
    DuplicateViolation { url_prefix: String },

    #[error("store task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("input error in {}: {message}", path.display())]
    Input { path: PathBuf, message: String },
}

impl ScoutError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        ScoutError::Storage {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Per-candidate failures; anything else should stop the run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScoutError::Config(_) | ScoutError::Input { .. })
    }
}

pub type ScoutResult<T> = Result<T, ScoutError>;

/// Shorten a URL for log lines and error messages.
pub fn url_prefix(url: &str) -> String {
    const MAX: usize = 60;
    if url.chars().count() <= MAX {
        url.to_string()
    } else {
        let head: String = url.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
