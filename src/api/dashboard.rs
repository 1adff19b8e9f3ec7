use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::Value;

use crate::auth::BearerToken;
use crate::error::AppError;
use crate::services::dashboard::{self, FALLBACK_MESSAGE};
use crate::state::AppState;

/// `GET /api/dashboard`
pub async fn show(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Json<Value>, AppError> {
    let body = dashboard::fetch_raw(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, FALLBACK_MESSAGE))?;
    Ok(Json(body))
}
