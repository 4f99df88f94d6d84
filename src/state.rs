use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::OpenAiProvider;
use crate::session::SessionService;
use crate::split::Cl100kCounter;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionService>,
}

impl AppState {
    /// Loads configuration and wires the pipeline: token counter, model
    /// provider, and the session service.
    ///
    /// A missing credential is not an initialization error; actions are
    /// rejected at the handler boundary instead, so the process can start
    /// and report the problem per request.
    pub fn initialize() -> Result<Self, ApiError> {
        let config = Arc::new(AppConfig::load()?);

        let api_key = config.llm.api_key.clone().unwrap_or_default();
        let provider = Arc::new(OpenAiProvider::new(config.llm.base_url.clone(), api_key));
        let counter = Arc::new(Cl100kCounter::new()?);

        let sessions = Arc::new(SessionService::new(&config, provider, counter)?);

        Ok(Self { config, sessions })
    }
}
