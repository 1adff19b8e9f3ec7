use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use crate::auth::BearerToken;
use crate::backend::BackendError;
use crate::error::AppError;
use crate::forms::check_account_email;
use crate::services::users::{self, UsersQuery};
use crate::state::AppState;

pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des utilisateurs";
pub const SAVE_FALLBACK: &str = "Erreur lors de l'enregistrement de l'utilisateur";
pub const DELETE_FALLBACK: &str = "Erreur lors de la suppression de l'utilisateur";
pub const NOT_AUTHORIZED: &str = "Non autorisé";

fn backend_error(fallback: &'static str) -> impl Fn(BackendError) -> AppError {
    move |err| AppError::from_backend(err, fallback)
}

/// `GET /api/users`, wrapped with a pagination block
pub async fn list(
    State(state): State<Arc<AppState>>,
    token: Option<BearerToken>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Value>, AppError> {
    let token = token.ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
    let (items, total) = users::list(&state.backend, token.as_str(), &query)
        .await
        .map_err(backend_error(FALLBACK_MESSAGE))?;
    Ok(Json(query.wrap(items, total)))
}

/// `POST /api/users`
///
/// Participants and system users share this route, so the body goes to the
/// backend untouched once its email is well formed.
pub async fn create(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    check_account_email(&body)?;

    let created = users::create(&state.backend, token.as_str(), &body)
        .await
        .map_err(backend_error(SAVE_FALLBACK))?;
    info!(role = body.get("role").and_then(serde_json::Value::as_str).unwrap_or("-"), "user created through the api");
    Ok(Json(created))
}

/// `GET /api/users/admins`
///
/// Errors carry the backend message, else `Erreur <status>: <reason>`.
pub async fn admins(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Json<Value>, AppError> {
    match users::admins_raw(&state.backend, token.as_str()).await {
        Ok(response) => Ok(Json(response.body)),
        Err(BackendError::Status { status, message }) => Err(AppError::Backend {
            status,
            message: message.unwrap_or_else(|| {
                format!(
                    "Erreur {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
            }),
        }),
        Err(err) => Err(AppError::from_backend(err, FALLBACK_MESSAGE)),
    }
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = users::get_raw(&state.backend, token.as_str(), &id)
        .await
        .map_err(backend_error(FALLBACK_MESSAGE))?;
    Ok(Json(user))
}

pub async fn replace(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let user = users::replace(&state.backend, token.as_str(), &id, &body)
        .await
        .map_err(backend_error(SAVE_FALLBACK))?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let user = users::update(&state.backend, token.as_str(), &id, &body)
        .await
        .map_err(backend_error(SAVE_FALLBACK))?;
    Ok(Json(user))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let body = users::delete(&state.backend, token.as_str(), &id)
        .await
        .map_err(backend_error(DELETE_FALLBACK))?;
    info!(id, "user deleted through the api");
    Ok((StatusCode::OK, Json(body)))
}
