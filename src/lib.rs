//! Company-news RAG chat backend.
//!
//! One analysis session per company: recent news is fetched and parsed at
//! the boundary, split into token-bounded passages, embedded into an
//! in-memory index, and questions are answered by a chat model grounded in
//! the top-k retrieved passages with source citation.

pub mod chat;
pub mod core;
pub mod index;
pub mod llm;
pub mod logging;
pub mod news;
pub mod server;
pub mod session;
pub mod split;
pub mod state;

pub use crate::chat::{Answer, RetrievalEngine};
pub use crate::core::config::AppConfig;
pub use crate::core::errors::ApiError;
pub use crate::index::{SearchHit, SemanticIndex};
pub use crate::news::{NewsFetcher, NewsRecord};
pub use crate::session::{Session, SessionService};
pub use crate::split::{Cl100kCounter, Passage, RecursiveTokenSplitter, TokenCounter};
pub use crate::state::AppState;
