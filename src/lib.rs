pub mod core;
pub mod features;
pub mod geo;
pub mod scraping;
pub mod tools;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::{AppState, ScoutError, ScoutResult};

// --- Flat module paths ---
pub use features::{details_store, search_input, url_store};
pub use scraping::{
    details, listing, CandidateSource, CsvCandidateSource, HtmlSnapshotSource, PageSource, SavedPages,
};
pub use tools::{batch_details, batch_ingest, ingest, search_url};
