use serde_json::Value;
use tracing::info;

use crate::auth::{Claims, Role, decode_claims};
use crate::backend::{BackendClient, BackendError};
use crate::models::User;

/// What a successful `/auth/login` gave us
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Option<User>,
    pub claims: Option<Claims>,
}

impl LoginOutcome {
    /// Role from the returned user, else from the token
    pub fn role(&self) -> Role {
        self.user
            .as_ref()
            .map(|user| user.role.clone())
            .or_else(|| self.claims.as_ref().map(|claims| claims.role.clone()))
            .unwrap_or_default()
    }
}

/// Exchanges credentials for a token
///
/// The token is read from `access_token`, else `token`. An answer without
/// either is reported as an invalid body.
pub async fn login(backend: &BackendClient, payload: &Value) -> Result<LoginOutcome, BackendError> {
    let body = backend.post(None, "/auth/login", payload).await?.body;

    let token = body
        .get("access_token")
        .or_else(|| body.get("token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| BackendError::InvalidBody("login answer without token".to_string()))?
        .to_string();
    let user = body
        .get("user")
        .cloned()
        .and_then(|user| serde_json::from_value::<User>(user).ok());
    let claims = decode_claims(&token);

    let outcome = LoginOutcome { token, user, claims };
    info!(role = %outcome.role(), "login accepted by backend");
    Ok(outcome)
}

/// Creates a participant account; no token is involved
pub async fn register(backend: &BackendClient, payload: &Value) -> Result<Value, BackendError> {
    Ok(backend.post(None, "/auth/register", payload).await?.body)
}

/// Current account, from `{user}` or a bare user object
pub async fn me(backend: &BackendClient, token: &str) -> Result<User, BackendError> {
    let body = backend.get(Some(token), "/auth/me", &[]).await?.body;
    let user = match body.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => body,
    };
    serde_json::from_value(user).map_err(|e| BackendError::InvalidBody(e.to_string()))
}

/// User built from token claims when `/auth/me` is unavailable
pub fn user_from_claims(claims: &Claims) -> User {
    User {
        id: claims.sub.clone(),
        email: claims.email.clone(),
        first_name: claims.first_name.clone(),
        last_name: claims.last_name.clone(),
        role: claims.role.clone(),
        ..Default::default()
    }
}
