pub mod details_store;
pub mod search_input;
pub mod url_store;

pub use details_store::{DetailsWriter, EnrichedWriter};
pub use search_input::{load_searches, SearchSpec};
pub use url_store::{SharedUrlStore, UrlStore};
