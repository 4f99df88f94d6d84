use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub company: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Starts a fresh analysis for a company: fetch → split → build.
///
/// The credential precondition is checked here, before any core operation
/// runs. An empty `articles` list in the response means "no news found".
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_credential(&state)?;
    let report = state.sessions.start_analysis(&request.company).await?;
    Ok(Json(report))
}

/// Answers one question against the current session.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_credential(&state)?;
    let answer = state.sessions.ask(&request.question).await?;
    Ok(Json(answer))
}

pub async fn get_session(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.sessions.summary().await {
        Some(summary) => Ok(Json(summary)),
        None => Err(ApiError::NotFound("no analysis session".to_string())),
    }
}

pub async fn delete_session(State(state): State<AppState>) -> impl IntoResponse {
    let existed = state.sessions.reset().await;
    Json(json!({ "reset": existed }))
}

fn require_credential(state: &AppState) -> Result<(), ApiError> {
    if !state.config.has_credential() {
        return Err(ApiError::BadRequest(
            "missing model credential: set OPENAI_API_KEY".to_string(),
        ));
    }
    Ok(())
}
