use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, cookie::CookieJar};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{Notice, page, redirect_notice, session_expired};
use crate::auth::CurrentUser;
use crate::format::french_date;
use crate::forms::{Mutation, ProfileForm, ValidationErrors, mutation_message};
use crate::models::User;
use crate::services;
use crate::state::AppState;

const PATH: &str = "/dashboard/profile";

fn profile_form(account: &User) -> ProfileForm {
    ProfileForm {
        first_name: account.first_name.clone().unwrap_or_default(),
        last_name: account.last_name.clone().unwrap_or_default(),
        title: account.title.clone().unwrap_or_default(),
        specialty: account.specialty.clone().unwrap_or_default(),
        phone_number: account.phone_number.clone().unwrap_or_default(),
    }
}

fn profile_data(
    user: &CurrentUser,
    account: &User,
    form: &ProfileForm,
    errors: Option<&ValidationErrors>,
    notice: &Notice,
) -> Value {
    json!({
        "layout": page(user, PATH, "Mon profil", notice),
        "account": {
            "name": account.full_name(),
            "email": account.email,
            "role": account.role.label(),
            "roleColor": account.role.color(),
            "since": account.created_at.as_deref().map(french_date),
        },
        "form": form,
        "errors": errors,
    })
}

/// Current account from `/auth/me`, else from the token claims
async fn current_account(state: &AppState, user: &CurrentUser) -> Result<User, crate::backend::BackendError> {
    match services::auth::me(&state.backend, &user.token).await {
        Ok(account) => Ok(account),
        Err(err) if err.is_unauthorized() => Err(err),
        Err(err) => {
            warn!(error = %err, "profile falls back to token claims");
            Ok(services::auth::user_from_claims(&user.claims))
        }
    }
}

/// `/dashboard/profile`
pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(notice): Query<Notice>,
) -> Response {
    match current_account(&state, &user).await {
        Ok(account) => {
            let form = profile_form(&account);
            state.views.render("profile", &profile_data(&user, &account, &form, None, &notice))
        }
        Err(_) => session_expired(jar, PATH),
    }
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        let account = services::auth::user_from_claims(&user.claims);
        let notice = Notice::error(errors.first().unwrap_or_default());
        return state.views.render_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "profile",
            &profile_data(&user, &account, &form, Some(&errors), &notice),
        );
    }

    match services::users::update(&state.backend, &user.token, &user.claims.sub, &form.payload()).await {
        Ok(_) => {
            info!("profile updated");
            redirect_notice(PATH, "success", "Profil mis à jour avec succès").into_response()
        }
        Err(err) if err.is_unauthorized() => session_expired(jar, PATH),
        Err(err) => {
            warn!(error = %err, "profile not updated");
            redirect_notice(PATH, "error", &mutation_message(&err, Mutation::Save)).into_response()
        }
    }
}
