//! In-memory semantic index.
//!
//! Built once per analysis session from the session's passages, read-only
//! afterwards, and discarded wholesale with the session. Vectors are
//! L2-normalized at insert so cosine similarity reduces to a dot product.

use serde::Serialize;

use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::split::Passage;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub passage: Passage,
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct SemanticIndex {
    entries: Vec<IndexEntry>,
}

impl SemanticIndex {
    /// Embeds every passage in one batched call and stores normalized
    /// vectors in passage order. An empty passage list yields an empty,
    /// always-empty index without touching the provider.
    pub async fn build(
        passages: Vec<Passage>,
        provider: &dyn LlmProvider,
        model_id: &str,
    ) -> Result<Self, ApiError> {
        if passages.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = provider.embed(&texts, model_id).await?;
        if embeddings.len() != passages.len() {
            return Err(ApiError::Model(format!(
                "embedding count mismatch: {} passages, {} vectors",
                passages.len(),
                embeddings.len()
            )));
        }

        let entries = passages
            .into_iter()
            .zip(embeddings)
            .map(|(passage, embedding)| IndexEntry {
                passage,
                embedding: normalize(embedding),
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embeds the query and returns the k highest-inner-product passages.
    /// Searching an empty index is the soft "no grounding available" case
    /// and returns an empty vec, never an error.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        provider: &dyn LlmProvider,
        model_id: &str,
    ) -> Result<Vec<SearchHit>, ApiError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embeddings = provider.embed(&[query.to_string()], model_id).await?;
        let query_vec = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Model("query embedding is empty".to_string()))?;

        Ok(self.rank(&normalize(query_vec), k))
    }

    /// Pure ranking over a pre-normalized query vector. Stable sort keeps
    /// ties in original passage order.
    pub fn rank(&self, query_vec: &[f32], k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                passage: entry.passage.clone(),
                score: dot(query_vec, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

fn normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
    vec
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
