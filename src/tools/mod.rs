pub mod batch_details;
pub mod batch_ingest;
pub mod ingest;
pub mod search_url;

pub use batch_details::{enrich_collection, EnrichSummary};
pub use batch_ingest::{ingest_batch, run_source, IngestSummary};
pub use ingest::{ingest_candidate, ingest_shared, resolve_candidate};
pub use search_url::build_search_url;
