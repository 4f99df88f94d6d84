use std::sync::Arc;

use serde::Serialize;
use url::Url;

use super::prompt::compose_messages;
use crate::core::config::{LlmConfig, RetrievalConfig};
use crate::core::errors::ApiError;
use crate::index::SearchHit;
use crate::llm::{ChatRequest, LlmProvider};
use crate::session::Session;

/// One answered turn: the model's answer plus the source links of the
/// passages it was grounded in, ordered by retrieval rank.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Url>,
}

pub struct RetrievalEngine {
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    top_k: usize,
}

impl RetrievalEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        llm: &LlmConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            chat_model: llm.chat_model.clone(),
            embedding_model: llm.embedding_model.clone(),
            temperature: llm.temperature,
            top_k: retrieval.top_k,
        }
    }

    /// Answers one question against the session's index.
    ///
    /// The raw question text is the retrieval query; history never rewrites
    /// it. Exactly one chat call is made, at the configured (minimum)
    /// temperature, with no retry. On success the user turn and the
    /// assistant turn (with its cited sources) are appended, in that order.
    /// On failure nothing is appended: a failed ask leaves history exactly
    /// as it was, so the caller can re-submit the question verbatim.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<Answer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        let hits = session
            .index
            .search(question, self.top_k, self.provider.as_ref(), &self.embedding_model)
            .await?;
        tracing::debug!("retrieved {} passages for question", hits.len());

        let messages = compose_messages(&session.company, session.history(), &hits, question);
        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        let text = self.provider.chat(request, &self.chat_model).await?;

        let sources = cited_sources(&hits);
        session.push_user(question);
        session.push_assistant(text.clone(), sources.clone());

        Ok(Answer { text, sources })
    }
}

/// Source links of the supplied passages, deduplicated, in first-appearance
/// (retrieval rank) order.
fn cited_sources(hits: &[SearchHit]) -> Vec<Url> {
    let mut sources: Vec<Url> = Vec::new();
    for hit in hits {
        if !sources.contains(&hit.passage.source) {
            sources.push(hit.passage.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::index::SemanticIndex;
    use crate::split::Passage;

    /// Embeds by letter profile; chat replies with a fixed answer or fails
    /// on demand.
    struct FakeProvider {
        fail_chat: bool,
        chat_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(fail_chat: bool) -> Self {
            Self {
                fail_chat,
                chat_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        async fn chat(&self, request: ChatRequest, _model: &str) -> Result<String, ApiError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_chat {
                return Err(ApiError::Model("quota exhausted".to_string()));
            }
            assert_eq!(request.temperature, Some(0.0));
            Ok("grounded answer".to_string())
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let mut v = vec![0.01f32; 4];
                    for ch in text.chars() {
                        if ('a'..='d').contains(&ch) {
                            v[(ch as usize) - ('a' as usize)] += 1.0;
                        }
                    }
                    v
                })
                .collect())
        }
    }

    fn passage(text: &str, link: &str) -> Passage {
        Passage {
            text: text.to_string(),
            source: Url::parse(link).unwrap(),
        }
    }

    async fn built_session(provider: &FakeProvider) -> Session {
        let passages = vec![
            passage("aaaa", "https://news.example.com/1"),
            passage("bbbb", "https://news.example.com/2"),
            passage("cccc", "https://news.example.com/3"),
        ];
        let index = SemanticIndex::build(passages, provider, "emb").await.unwrap();
        Session::new("Sample Corp", index)
    }

    fn engine(provider: Arc<dyn LlmProvider>) -> RetrievalEngine {
        RetrievalEngine::new(
            provider,
            &LlmConfig::default(),
            &RetrievalConfig { top_k: 3 },
        )
    }

    #[tokio::test]
    async fn successful_ask_appends_both_turns_with_sources() {
        let provider = Arc::new(FakeProvider::new(false));
        let mut session = built_session(&provider).await;
        let engine = engine(provider.clone());

        let answer = engine.ask(&mut session, "aaaa").await.unwrap();

        assert_eq!(answer.text, "grounded answer");
        assert_eq!(answer.sources.len(), 3);
        assert_eq!(answer.sources[0].as_str(), "https://news.example.com/1");

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "aaaa");
        assert!(history[0].sources.is_empty());
        assert_eq!(history[1].text, "grounded answer");
        assert_eq!(history[1].sources, answer.sources);
    }

    #[tokio::test]
    async fn cited_sources_follow_retrieval_rank_and_dedup() {
        let hits = vec![
            SearchHit {
                passage: passage("p1", "https://news.example.com/x"),
                score: 0.9,
            },
            SearchHit {
                passage: passage("p2", "https://news.example.com/y"),
                score: 0.8,
            },
            SearchHit {
                passage: passage("p3", "https://news.example.com/x"),
                score: 0.7,
            },
        ];
        let sources = cited_sources(&hits);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].as_str(), "https://news.example.com/x");
        assert_eq!(sources[1].as_str(), "https://news.example.com/y");
    }

    #[tokio::test]
    async fn failed_chat_leaves_history_untouched() {
        let build_provider = FakeProvider::new(false);
        let mut session = built_session(&build_provider).await;
        let engine = engine(Arc::new(FakeProvider::new(true)));

        let err = engine.ask(&mut session, "aaaa").await.unwrap_err();
        assert!(matches!(err, ApiError::Model(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn n_asks_leave_2n_alternating_turns() {
        let provider = Arc::new(FakeProvider::new(false));
        let mut session = built_session(&provider).await;
        let engine = engine(provider.clone());

        for question in ["aaaa", "bbbb", "cccc"] {
            engine.ask(&mut session, question).await.unwrap();
        }

        let history = session.history();
        assert_eq!(history.len(), 6);
        for (i, turn) in history.iter().enumerate() {
            let expected = if i % 2 == 0 {
                crate::session::Role::User
            } else {
                crate::session::Role::Assistant
            };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_model_call() {
        let provider = Arc::new(FakeProvider::new(false));
        let mut session = built_session(&provider).await;
        let engine = engine(provider.clone());

        let err = engine.ask(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 0);
    }
}
