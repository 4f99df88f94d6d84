//! Analysis session state.
//!
//! A session owns exactly one index and one conversation history, scoped to
//! one company and one scrape. Starting a new analysis discards the previous
//! session wholesale; nothing is shared or merged across sessions.

mod service;

pub use service::{AnalysisReport, ArticleSummary, SessionService, SessionSummary};

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::index::SemanticIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One history entry. Assistant turns carry the sources actually cited;
/// turns are never mutated or removed within a session.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Url>,
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub company: String,
    pub created_at: DateTime<Utc>,
    pub index: SemanticIndex,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(company: impl Into<String>, index: SemanticIndex) -> Self {
        Self {
            id: Uuid::new_v4(),
            company: company.into(),
            created_at: Utc::now(),
            index,
            history: Vec::new(),
        }
    }

    /// Append-only view of the conversation so far.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.history.push(ConversationTurn {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>, sources: Vec<Url>) {
        self.history.push(ConversationTurn {
            role: Role::Assistant,
            text: text.into(),
            sources,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_alternates_in_push_order() {
        let mut session = Session::new("Sample Corp", SemanticIndex::default());
        session.push_user("q1");
        session.push_assistant("a1", Vec::new());
        session.push_user("q2");
        session.push_assistant("a2", Vec::new());

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[2].text, "q2");
        assert_eq!(history[3].text, "a2");
    }
}
