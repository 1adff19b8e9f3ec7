use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use tracing::{info, warn};

use super::{Claims, Role, decode_claims, session};
use crate::error::AppError;
use crate::nav;
use crate::state::AppState;

/// Staff member behind the current page request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn role(&self) -> &Role {
        &self.claims.role
    }
}

/// Redirect to the login page remembering where the user was going
pub fn login_redirect(from: &str) -> Redirect {
    Redirect::to(&format!("/login?from={}", urlencoding::encode(from)))
}

/// Authentication middleware for the dashboard pages
///
/// Checks the session cookie and the role carried by the token, then either
/// passes the request through with a [`CurrentUser`] extension or answers
/// with the matching redirect.
///
/// # Arguments
/// * `state` - Shared application state
/// * `jar` - Cookie jar holding `auth_token` and `auth_activity`
/// * `request` - The incoming request
/// * `next` - Next middleware in the chain
///
/// # Returns
/// * `Response` - The page, a redirect to `/login`, or the access denied page
pub async fn require_staff(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let from = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let now = Utc::now().timestamp();

    let Some(token) = session::token(&jar) else {
        return login_redirect(&from).into_response();
    };

    let claims = match decode_claims(&token) {
        Some(claims) if !claims.is_expired(now) => claims,
        _ => {
            info!(path, "discarding unreadable or expired session");
            return (session::clear(jar), login_redirect(&from)).into_response();
        }
    };

    if session::is_idle(&jar, now, state.config.inactivity_minutes) {
        info!(path, "session closed after inactivity");
        return (session::clear(jar), Redirect::to("/login?reason=inactivity")).into_response();
    }

    if !claims.role.is_staff() {
        warn!(path, role = %claims.role, "non-staff account denied");
        return state.views.denied(StatusCode::FORBIDDEN);
    }

    if let Some(allowed) = nav::required_roles(&path) {
        if !allowed.contains(&claims.role) {
            warn!(path, role = %claims.role, "role not allowed on page");
            let notice = urlencoding::encode("Vous n'avez pas accès à cette page");
            return Redirect::to(&format!("/dashboard?error={notice}")).into_response();
        }
    }

    request.extensions_mut().insert(CurrentUser { token, claims });
    let response = next.run(request).await;

    (session::touch(jar, &state.config, now), response).into_response()
}

/// Sends already signed-in users from `/login` and `/register` to the dashboard
pub async fn redirect_signed_in(jar: CookieJar, request: Request, next: Next) -> Response {
    let now = Utc::now().timestamp();
    let signed_in = session::token(&jar)
        .and_then(|token| decode_claims(&token))
        .is_some_and(|claims| !claims.is_expired(now) && claims.role.is_staff());

    if signed_in {
        return Redirect::to("/dashboard").into_response();
    }
    next.run(request).await
}

/// Bearer token for the `/api` proxy routes
///
/// Taken from the `auth_token` cookie, else from an `Authorization: Bearer`
/// header. Rejects with 401 `Token d'authentification manquant`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(token) = session::token(&jar) {
            return Ok(BearerToken(token));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::missing_token())?;

        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(AppError::missing_token());
        }
        Ok(BearerToken(token.to_string()))
    }
}

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
