//! Conversational retrieval: top-k grounding, prompt composition, and the
//! single chat call per user turn.

mod engine;
mod prompt;

pub use engine::{Answer, RetrievalEngine};
pub use prompt::compose_messages;
