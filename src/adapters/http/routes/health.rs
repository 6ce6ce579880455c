use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

/// GET /health
/// Succeeds only when the database answers.
async fn health(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    app_state.subscription_use_cases.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
