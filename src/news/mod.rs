//! News acquisition boundary.
//!
//! Fetches a date-windowed news search page for a company and parses it into
//! typed records at the boundary; nothing downstream ever sees raw markup.

mod fetcher;

pub use fetcher::{parse_search_page, NewsFetcher};

use serde::Serialize;
use url::Url;

/// One article entry in search-result order. Immutable once parsed.
#[derive(Debug, Clone, Serialize)]
pub struct NewsRecord {
    pub title: String,
    pub link: Url,
    /// Summary snippet; may be empty when the result page carries none.
    pub content: String,
}
