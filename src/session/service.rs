use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use super::Session;
use crate::chat::{Answer, RetrievalEngine};
use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::index::SemanticIndex;
use crate::llm::LlmProvider;
use crate::news::{NewsFetcher, NewsRecord};
use crate::split::{RecursiveTokenSplitter, TokenCounter};

#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub title: String,
    pub link: Url,
}

/// Outcome of one "start analysis" action. Empty `articles` is the soft
/// "no news found" condition: no session was built and the caller decides
/// the UX.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub company: String,
    pub articles: Vec<ArticleSummary>,
    pub passage_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub company: String,
    pub created_at: DateTime<Utc>,
    pub passage_count: usize,
    pub turn_count: usize,
}

/// Drives the session lifecycle: fetch → split → build on "start analysis",
/// engine delegation on "ask", wholesale discard on reset or re-analysis.
///
/// One mutex serializes every action; each user action runs to completion
/// (or failure) before the next is accepted.
pub struct SessionService {
    fetcher: NewsFetcher,
    splitter: RecursiveTokenSplitter,
    counter: Arc<dyn TokenCounter>,
    provider: Arc<dyn LlmProvider>,
    engine: RetrievalEngine,
    embedding_model: String,
    session: Mutex<Option<Session>>,
}

impl SessionService {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn LlmProvider>,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            fetcher: NewsFetcher::new(config.news.clone())?,
            splitter: RecursiveTokenSplitter::new(&config.split),
            counter,
            engine: RetrievalEngine::new(provider.clone(), &config.llm, &config.retrieval),
            provider,
            embedding_model: config.llm.embedding_model.clone(),
            session: Mutex::new(None),
        })
    }

    /// Builds a fresh session for `company`. Any prior session, index and
    /// history alike, is discarded before the fetch, never merged.
    pub async fn start_analysis(&self, company: &str) -> Result<AnalysisReport, ApiError> {
        let company = company.trim();
        if company.is_empty() {
            return Err(ApiError::BadRequest(
                "company name must not be empty".to_string(),
            ));
        }

        let mut current = self.session.lock().await;
        *current = None;

        let records = self.fetcher.fetch(company).await?;
        self.install(&mut current, company, records).await
    }

    /// Answers one question against the current session.
    pub async fn ask(&self, question: &str) -> Result<Answer, ApiError> {
        let mut current = self.session.lock().await;
        let session = current.as_mut().ok_or_else(|| {
            ApiError::BadRequest("no analysis session: start an analysis first".to_string())
        })?;
        self.engine.ask(session, question).await
    }

    /// Drops the current session. Returns whether one existed.
    pub async fn reset(&self) -> bool {
        self.session.lock().await.take().is_some()
    }

    pub async fn summary(&self) -> Option<SessionSummary> {
        self.session.lock().await.as_ref().map(|s| SessionSummary {
            company: s.company.clone(),
            created_at: s.created_at,
            passage_count: s.index.len(),
            turn_count: s.history().len(),
        })
    }

    async fn install(
        &self,
        slot: &mut Option<Session>,
        company: &str,
        records: Vec<NewsRecord>,
    ) -> Result<AnalysisReport, ApiError> {
        if records.is_empty() {
            tracing::warn!("no recent news found for '{}'", company);
            return Ok(AnalysisReport {
                company: company.to_string(),
                articles: Vec::new(),
                passage_count: 0,
            });
        }

        let passages = self.splitter.split_records(&records, self.counter.as_ref());
        let index =
            SemanticIndex::build(passages, self.provider.as_ref(), &self.embedding_model).await?;
        let passage_count = index.len();

        tracing::info!(
            "built session for '{}': {} articles, {} passages",
            company,
            records.len(),
            passage_count
        );

        let articles = records
            .into_iter()
            .map(|r| ArticleSummary {
                title: r.title,
                link: r.link,
            })
            .collect();

        *slot = Some(Session::new(company, index));

        Ok(AnalysisReport {
            company: company.to_string(),
            articles,
            passage_count,
        })
    }

    /// Analysis entry point for pre-fetched records; shared by tests that
    /// bypass the network fetch.
    #[cfg(test)]
    async fn analyze_records(
        &self,
        company: &str,
        records: Vec<NewsRecord>,
    ) -> Result<AnalysisReport, ApiError> {
        let mut current = self.session.lock().await;
        *current = None;
        self.install(&mut current, company, records).await
    }
}
