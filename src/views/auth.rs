use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, cookie::CookieJar};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{Notice, redirect_notice};
use crate::auth::{decode_claims, session};
use crate::forms::{LOGIN_STAFF_ONLY, LoginForm, ParticipantForm, ValidationErrors, login_message};
use crate::services;
use crate::state::AppState;

pub const INACTIVITY_MESSAGE: &str =
    "Votre session a expiré après une période d'inactivité. Veuillez vous reconnecter.";
pub const REGISTER_FALLBACK: &str = "Une erreur est survenue lors de l'inscription";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    from: Option<String>,
    reason: Option<String>,
    #[serde(flatten)]
    notice: Notice,
}

/// Only same-site absolute paths are followed after login
///
/// Browsers read `\` as `/`, so any backslash is refused along with `//host`.
pub fn safe_target(from: Option<&str>) -> Option<&str> {
    from.map(str::trim)
        .filter(|target| target.starts_with('/') && !target.starts_with("//") && !target.contains('\\'))
}

/// `/` goes to the dashboard when a session exists, else to the login page
pub async fn root(jar: CookieJar) -> Redirect {
    let now = Utc::now().timestamp();
    let signed_in = session::token(&jar)
        .and_then(|token| decode_claims(&token))
        .is_some_and(|claims| !claims.is_expired(now) && claims.role.is_staff());

    if signed_in {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

fn login_data(form: &LoginForm, errors: Option<&ValidationErrors>, notice: &Notice) -> Value {
    json!({
        "title": "Connexion",
        "email": form.email,
        "from": form.from,
        "errors": errors,
        "notice": notice,
    })
}

pub async fn login_page(State(state): State<Arc<AppState>>, Query(query): Query<LoginQuery>) -> Response {
    let mut notice = query.notice;
    if query.reason.as_deref() == Some("inactivity") {
        notice.error = Some(INACTIVITY_MESSAGE.to_string());
    }

    let form = LoginForm { from: query.from, ..Default::default() };
    state.views.render("login", &login_data(&form, None, &notice))
}

/// Checks the credentials, then asks the backend for a token
///
/// Accounts without a staff role are refused here and get no cookie, so the
/// dashboard never sees them.
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        let notice = Notice::error(errors.first().unwrap_or_default());
        return state.views.render_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "login",
            &login_data(&form, Some(&errors), &notice),
        );
    }

    let outcome = match services::auth::login(&state.backend, &form.payload()).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "login refused");
            let notice = Notice::error(login_message(&err));
            return state.views.render_status(
                StatusCode::UNAUTHORIZED,
                "login",
                &login_data(&form, None, &notice),
            );
        }
    };

    if !outcome.role().is_staff() {
        info!(role = %outcome.role(), "non-staff login kept out of the dashboard");
        return state.views.render_status(
            StatusCode::FORBIDDEN,
            "login",
            &login_data(&form, None, &Notice::error(LOGIN_STAFF_ONLY)),
        );
    }

    let jar = session::start(jar, &outcome.token, &state.config, Utc::now().timestamp());
    let target = match safe_target(form.from.as_deref()) {
        Some(target) => Redirect::to(target),
        None => redirect_notice("/dashboard", "success", "Connexion réussie"),
    };
    (jar, target).into_response()
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        session::clear(jar),
        redirect_notice("/login", "success", "Vous avez été déconnecté"),
    )
}

fn register_data(form: &ParticipantForm, errors: Option<&ValidationErrors>, notice: &Notice) -> Value {
    let modes: Vec<Value> = ParticipantForm::MODES
        .iter()
        .map(|mode| {
            json!({
                "value": mode,
                "label": if *mode == "online" { "En ligne" } else { "En présentiel" },
                "selected": form.participation_mode == *mode,
            })
        })
        .collect();

    json!({
        "title": "Inscription",
        "form": form,
        "modes": modes,
        "errors": errors,
        "notice": notice,
    })
}

pub async fn register_page(State(state): State<Arc<AppState>>, Query(notice): Query<Notice>) -> Response {
    state
        .views
        .render("register", &register_data(&ParticipantForm::default(), None, &notice))
}

pub async fn register_submit(State(state): State<Arc<AppState>>, Form(form): Form<ParticipantForm>) -> Response {
    if let Err(errors) = form.validate() {
        let notice = Notice::error(errors.first().unwrap_or_default());
        return state.views.render_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "register",
            &register_data(&form, Some(&errors), &notice),
        );
    }

    match services::auth::register(&state.backend, &form.payload()).await {
        Ok(_) => redirect_notice(
            "/login",
            "success",
            "Inscription réussie. Vous pouvez maintenant vous connecter.",
        )
        .into_response(),
        Err(err) => {
            warn!(error = %err, "registration refused");
            let message = err.message().unwrap_or(REGISTER_FALLBACK).to_string();
            state.views.render_status(
                err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "register",
                &register_data(&form, None, &Notice::error(message)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_paths_are_followed() {
        assert_eq!(safe_target(Some("/dashboard/users")), Some("/dashboard/users"));
        assert_eq!(safe_target(Some("//evil.example")), None);
        assert_eq!(safe_target(Some("https://evil.example")), None);
        assert_eq!(safe_target(Some("/\\evil.example")), None);
        assert_eq!(safe_target(Some("/dashboard\\..\\x")), None);
        assert_eq!(safe_target(None), None);
    }
}
