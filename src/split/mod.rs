//! Passage splitting.
//!
//! Turns fetched news records into token-bounded, overlapping passages, the
//! unit of retrieval. Token counts use the exact chat-model vocabulary, never
//! a character approximation, so passages are guaranteed to fit prompt
//! budgets downstream.

mod counter;
mod splitter;

pub use counter::{Cl100kCounter, TokenCounter};
pub use splitter::RecursiveTokenSplitter;

use serde::Serialize;
use url::Url;

/// A token-bounded slice of one article, carrying the article link for
/// citation.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub text: String,
    pub source: Url,
}
