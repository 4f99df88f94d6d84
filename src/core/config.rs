use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Env var naming the config file. Falls back to `./stocklens.toml`.
pub const CONFIG_PATH_ENV: &str = "STOCKLENS_CONFIG";
/// Env var carrying the model credential. Overrides the file value.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Env var overriding the model endpoint base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Upper bound on fetched articles per analysis.
    pub max_articles: usize,
    /// Trailing search window in days, ending today.
    pub lookback_days: i64,
    /// Request timeout for the news fetch.
    pub request_timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            max_articles: 10,
            lookback_days: 5,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Maximum tokens per passage, measured with the exact model vocabulary.
    pub max_chunk_tokens: usize,
    /// Token overlap between consecutive passages of one article.
    pub overlap_tokens: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 900,
            overlap_tokens: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint root (no trailing `/v1`).
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// Kept at the minimum so answers are reproducible for one grounding.
    pub temperature: f64,
    /// Bearer credential. Usually supplied via `OPENAI_API_KEY` instead.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news: NewsConfig,
    pub split: SplitConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            news: NewsConfig::default(),
            split: SplitConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Loads defaults, merges the TOML file if present, then applies env
    /// overrides. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ApiError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("stocklens.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.llm.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.llm.base_url = url;
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Internal(format!("failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            ApiError::Internal(format!("failed to parse config {}: {}", path.display(), e))
        })
    }

    /// The credential precondition: actions must be rejected before any
    /// model call when this is false.
    pub fn has_credential(&self) -> bool {
        self.llm
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_pipeline_budgets() {
        let config = AppConfig::default();
        assert_eq!(config.news.max_articles, 10);
        assert_eq!(config.news.lookback_days, 5);
        assert_eq!(config.split.max_chunk_tokens, 900);
        assert_eq!(config.split.overlap_tokens, 100);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.llm.temperature, 0.0);
        assert!(!config.has_credential());
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[split]\nmax_chunk_tokens = 256\n\n[llm]\napi_key = \"sk-test\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.split.max_chunk_tokens, 256);
        assert_eq!(config.split.overlap_tokens, 100);
        assert_eq!(config.news.max_articles, 10);
        assert!(config.has_credential());
    }

    #[test]
    fn blank_credential_does_not_count() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("   ".to_string());
        assert!(!config.has_credential());
    }
}
