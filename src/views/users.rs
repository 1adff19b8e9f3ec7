use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, cookie::CookieJar};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{Notice, page, redirect_notice, session_expired};
use crate::auth::{CurrentUser, Role};
use crate::forms::{Mutation, SystemUserForm, ValidationErrors, mutation_message};
use crate::models::{SystemUserRow, User};
use crate::services;
use crate::state::AppState;

const LIST_PATH: &str = "/dashboard/users";
pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des utilisateurs système";

/// Form post, with `confirmed=yes` once the user accepted the summary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSubmission {
    #[serde(flatten)]
    pub form: SystemUserForm,
    pub confirmed: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Confirmation {
    pub confirmed: Option<String>,
}

fn is_confirmed(value: &Option<String>) -> bool {
    value.as_deref() == Some("yes")
}

/// `/dashboard/users`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(mut notice): Query<Notice>,
) -> Response {
    let rows: Vec<SystemUserRow> = match services::users::system_users(&state.backend, &user.token).await {
        Ok(users) => users.iter().map(SystemUserRow::from).collect(),
        Err(err) if err.is_unauthorized() => return session_expired(jar, LIST_PATH),
        Err(err) => {
            warn!(error = %err, "system users unavailable");
            notice.error = Some(err.message().unwrap_or(FALLBACK_MESSAGE).to_string());
            Vec::new()
        }
    };

    let data = json!({
        "layout": page(&user, LIST_PATH, "Utilisateurs système", &notice),
        "rows": rows,
        "total": rows.len(),
    });
    state.views.render("users", &data)
}

fn role_options(selected: &str) -> Vec<Value> {
    Role::ASSIGNABLE
        .iter()
        .map(|role| {
            json!({
                "value": role.as_str(),
                "label": role.label(),
                "selected": role.as_str() == selected,
            })
        })
        .collect()
}

fn form_data(
    user: &CurrentUser,
    path: &str,
    form: &SystemUserForm,
    editing: bool,
    errors: Option<&ValidationErrors>,
    notice: &Notice,
) -> Value {
    let title = if editing {
        "Modifier l'utilisateur système"
    } else {
        "Nouvel utilisateur système"
    };

    json!({
        "layout": page(user, path, title, notice),
        "heading": title,
        "action": path,
        "editing": editing,
        "form": form,
        "roles": role_options(&form.role),
        "errors": errors,
    })
}

/// Summary page asking the user to confirm a create or an edit
fn confirm_save(user: &CurrentUser, path: &str, form: &SystemUserForm, editing: bool) -> Value {
    let role = Role::from(form.role.clone());
    let summary = vec![
        json!({"label": "Email", "value": form.email.trim()}),
        json!({"label": "Prénom", "value": form.first_name.trim()}),
        json!({"label": "Nom", "value": form.last_name.trim()}),
        json!({"label": "Rôle", "value": role.label()}),
    ];
    let fields: Vec<Value> = [
        ("email", &form.email),
        ("password", &form.password),
        ("firstName", &form.first_name),
        ("lastName", &form.last_name),
        ("title", &form.title),
        ("specialty", &form.specialty),
        ("phoneNumber", &form.phone_number),
        ("role", &form.role),
    ]
    .into_iter()
    .map(|(name, value)| json!({"name": name, "value": value}))
    .collect();

    let (heading, message) = if editing {
        ("Confirmer la modification", "Enregistrer les modifications de cet utilisateur ?")
    } else {
        ("Confirmer la création", "Créer cet utilisateur système ?")
    };

    json!({
        "layout": page(user, path, heading, &Notice::default()),
        "heading": heading,
        "message": message,
        "summary": summary,
        "action": path,
        "fields": fields,
        "cancel": LIST_PATH,
        "danger": false,
    })
}

pub async fn new_form(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(notice): Query<Notice>,
) -> Response {
    let form = SystemUserForm {
        role: Role::Manager.as_str().to_string(),
        ..Default::default()
    };
    let path = "/dashboard/users/new";
    state.views.render("user_form", &form_data(&user, path, &form, false, None, &notice))
}

/// Shared handling of create and edit posts
///
/// Validation happens before anything is sent; an unconfirmed post renders
/// the summary page instead of calling the backend.
async fn save(
    state: &AppState,
    user: &CurrentUser,
    jar: CookieJar,
    path: &str,
    id: Option<&str>,
    submission: UserSubmission,
) -> Response {
    let editing = id.is_some();
    let form = submission.form;

    if let Err(errors) = form.validate(editing) {
        let notice = Notice::error(errors.first().unwrap_or_default());
        return state.views.render_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "user_form",
            &form_data(user, path, &form, editing, Some(&errors), &notice),
        );
    }

    if !is_confirmed(&submission.confirmed) {
        return state.views.render("confirm", &confirm_save(user, path, &form, editing));
    }

    let result = match id {
        Some(id) => services::users::update(&state.backend, &user.token, id, &form.payload()).await,
        None => services::users::create(&state.backend, &user.token, &form.payload()).await,
    };

    match result {
        Ok(_) => {
            info!(editing, role = %form.role, "system user saved");
            let message = if editing {
                "Utilisateur système modifié avec succès"
            } else {
                "Utilisateur système créé avec succès"
            };
            redirect_notice(LIST_PATH, "success", message).into_response()
        }
        Err(err) if err.is_unauthorized() => session_expired(jar, path),
        Err(err) => {
            warn!(error = %err, editing, "system user not saved");
            let notice = Notice::error(mutation_message(&err, Mutation::Save));
            state.views.render_status(
                err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "user_form",
                &form_data(user, path, &form, editing, None, &notice),
            )
        }
    }
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(submission): Form<UserSubmission>,
) -> Response {
    save(&state, &user, jar, "/dashboard/users/new", None, submission).await
}

fn edit_form(account: &User) -> SystemUserForm {
    SystemUserForm {
        email: account.email.clone(),
        password: String::new(),
        first_name: account.first_name.clone().unwrap_or_default(),
        last_name: account.last_name.clone().unwrap_or_default(),
        title: account.title.clone().unwrap_or_default(),
        specialty: account.specialty.clone().unwrap_or_default(),
        phone_number: account.phone_number.clone().unwrap_or_default(),
        role: account.role.as_str().to_string(),
    }
}

pub async fn edit_form_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(notice): Query<Notice>,
) -> Response {
    let path = format!("/dashboard/users/{id}/edit");
    match services::users::get(&state.backend, &user.token, &id).await {
        Ok(account) => state
            .views
            .render("user_form", &form_data(&user, &path, &edit_form(&account), true, None, &notice)),
        Err(err) if err.is_unauthorized() => session_expired(jar, &path),
        Err(err) => {
            warn!(error = %err, id, "system user unavailable");
            redirect_notice(LIST_PATH, "error", &mutation_message(&err, Mutation::Save)).into_response()
        }
    }
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(submission): Form<UserSubmission>,
) -> Response {
    let path = format!("/dashboard/users/{id}/edit");
    save(&state, &user, jar, &path, Some(&id), submission).await
}

pub async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let path = format!("/dashboard/users/{id}/delete");
    let account = match services::users::get(&state.backend, &user.token, &id).await {
        Ok(account) => account,
        Err(err) if err.is_unauthorized() => return session_expired(jar, &path),
        Err(err) => {
            warn!(error = %err, id, "system user unavailable");
            return redirect_notice(LIST_PATH, "error", &mutation_message(&err, Mutation::Delete))
                .into_response();
        }
    };

    let data = json!({
        "layout": page(&user, &path, "Supprimer l'utilisateur", &Notice::default()),
        "heading": "Supprimer l'utilisateur",
        "message": format!(
            "Êtes-vous sûr de vouloir supprimer {} ({}) ? Cette action est irréversible.",
            account.full_name(),
            account.email
        ),
        "summary": [],
        "action": path,
        "fields": [],
        "cancel": LIST_PATH,
        "danger": true,
    });
    state.views.render("confirm", &data)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(confirmation): Form<Confirmation>,
) -> Response {
    let path = format!("/dashboard/users/{id}/delete");
    if !is_confirmed(&confirmation.confirmed) {
        return axum::response::Redirect::to(&path).into_response();
    }
    if id == user.claims.sub {
        return redirect_notice(LIST_PATH, "error", "Vous ne pouvez pas supprimer votre propre compte")
            .into_response();
    }

    match services::users::delete(&state.backend, &user.token, &id).await {
        Ok(_) => {
            info!(id, "system user deleted");
            redirect_notice(LIST_PATH, "success", "Utilisateur système supprimé avec succès").into_response()
        }
        Err(err) if err.is_unauthorized() => session_expired(jar, &path),
        Err(err) => {
            warn!(error = %err, id, "system user not deleted");
            redirect_notice(LIST_PATH, "error", &mutation_message(&err, Mutation::Delete)).into_response()
        }
    }
}
