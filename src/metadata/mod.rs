//! Page metadata enrichment: fetch a bookmarked URL, pull out a title,
//! description and favicon, and merge them with what the user typed.

pub mod enrich;
pub mod extract;
pub mod fetcher;
pub mod merge;

pub use enrich::{Enricher, METADATA_FETCH_TIMEOUT, TITLE_FETCH_TIMEOUT};
pub use extract::{extract, extract_title};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use merge::should_refetch;
