use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::{BearerToken, decode_claims, session};
use crate::backend::BackendError;
use crate::error::AppError;
use crate::forms::{LOGIN_STAFF_ONLY, LoginForm, ParticipantForm, login_message};
use crate::services::auth as accounts;
use crate::state::AppState;

pub const REGISTER_FALLBACK: &str = "Une erreur est survenue lors de l'inscription";
pub const INVALID_ANSWER: &str = "Réponse invalide du serveur";

/// `POST /api/register`: participant sign-up, no token involved
///
/// Backend failures keep their status; a reply that is not JSON becomes a 500.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let form: ParticipantForm = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Données invalides".to_string()))?;
    form.validate()?;

    match accounts::register(&state.backend, &form.payload()).await {
        Ok(created) => {
            info!("participant registered");
            Ok(Json(created))
        }
        Err(err @ (BackendError::InvalidBody(_) | BackendError::UnreadableStatus { .. })) => {
            warn!(error = %err, "registration answer was not json");
            Err(AppError::Internal(INVALID_ANSWER.to_string()))
        }
        Err(err) => Err(AppError::from_backend(err, REGISTER_FALLBACK)),
    }
}

/// `POST /api/auth/login`: stores the token in the session cookies
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    form.validate()?;

    let outcome = accounts::login(&state.backend, &form.payload())
        .await
        .map_err(|err| AppError::Backend {
            status: err.status().unwrap_or(StatusCode::BAD_GATEWAY),
            message: login_message(&err),
        })?;

    if !outcome.role().is_staff() {
        return Err(AppError::Forbidden(LOGIN_STAFF_ONLY.to_string()));
    }

    let user = match (&outcome.user, &outcome.claims) {
        (Some(user), _) => json!(user),
        (None, Some(claims)) => json!(accounts::user_from_claims(claims)),
        (None, None) => Value::Null,
    };
    let jar = session::start(jar, &outcome.token, &state.config, Utc::now().timestamp());
    Ok((jar, Json(json!({ "success": true, "user": user }))))
}

/// `POST /api/auth/logout`
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (session::clear(jar), Json(json!({ "success": true })))
}

/// `GET /api/auth/me`, from the backend or, failing that, from the token
pub async fn me(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Json<Value>, AppError> {
    match accounts::me(&state.backend, token.as_str()).await {
        Ok(user) => Ok(Json(json!({ "user": user }))),
        Err(err) if err.is_unauthorized() => Err(AppError::Unauthorized(
            err.message().unwrap_or("Session expirée").to_string(),
        )),
        Err(err) => {
            warn!(error = %err, "profile answered from token claims");
            let claims = decode_claims(token.as_str()).ok_or_else(AppError::missing_token)?;
            Ok(Json(json!({ "user": accounts::user_from_claims(&claims) })))
        }
    }
}
