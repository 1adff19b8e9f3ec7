//! Server-rendered dashboard pages.
//!
//! Templates are compiled into the binary with `include_str!` and rendered
//! with handlebars. Every dashboard page shares the `layout` partial, which
//! draws the navigation, the user card and the notice toast.

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod participants;
pub mod profile;
pub mod users;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use handlebars::{Handlebars, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use crate::auth::{CurrentUser, login_redirect, session};
use crate::nav;

const PARTIALS: &[(&str, &str)] = &[
    ("layout", include_str!("../templates/layout.hbs")),
    ("pager", include_str!("../templates/pager.hbs")),
];

const TEMPLATES: &[(&str, &str)] = &[
    ("login", include_str!("../templates/login.hbs")),
    ("register", include_str!("../templates/register.hbs")),
    ("denied", include_str!("../templates/denied.hbs")),
    ("dashboard", include_str!("../templates/dashboard.hbs")),
    ("participants", include_str!("../templates/participants.hbs")),
    ("participant", include_str!("../templates/participant.hbs")),
    ("users", include_str!("../templates/users.hbs")),
    ("user_form", include_str!("../templates/user_form.hbs")),
    ("confirm", include_str!("../templates/confirm.hbs")),
    ("page_visits", include_str!("../templates/page_visits.hbs")),
    ("video_watches", include_str!("../templates/video_watches.hbs")),
    ("profile", include_str!("../templates/profile.hbs")),
];

/// Compiled page templates
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        for (name, source) in PARTIALS {
            registry.register_partial(name, *source)?;
        }
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, *source)?;
        }
        Ok(Views { registry })
    }

    /// Renders `name` as an HTML page, or a plain 500 if rendering fails
    pub fn render(&self, name: &str, data: &Value) -> Response {
        match self.registry.render(name, data) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!(template = name, error = %e, "template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne du serveur").into_response()
            }
        }
    }

    pub fn render_status(&self, status: StatusCode, name: &str, data: &Value) -> Response {
        (status, self.render(name, data)).into_response()
    }

    /// "Accès refusé" page
    pub fn denied(&self, status: StatusCode) -> Response {
        self.render_status(
            status,
            "denied",
            &json!({
                "title": "Accès refusé",
                "message": "Vous n'avez pas les droits nécessaires pour accéder au tableau de bord.",
            }),
        )
    }
}

/// `?success=` and `?error=` parameters shown as a toast
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notice {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice { success: None, error: Some(message.into()) }
    }
}

/// Shared layout data for a dashboard page
pub fn page(user: &CurrentUser, path: &str, title: &str, notice: &Notice) -> Value {
    json!({
        "title": title,
        "nav": nav::visible_for(user.role(), path),
        "user": {
            "name": user.claims.display_name(),
            "email": user.claims.email,
            "role": user.role().label(),
        },
        "notice": notice,
    })
}

/// Redirect to `path` carrying a toast message
pub fn redirect_notice(path: &str, kind: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}{kind}={}", urlencoding::encode(message)))
}

/// The backend refused our token: drop the session and ask for a new login
pub fn session_expired(jar: CookieJar, path: &str) -> Response {
    (session::clear(jar), login_redirect(path)).into_response()
}

/// Links to the neighbouring pages of a server-paginated table
///
/// `query` carries the other parameters to keep (sort, filters), already
/// encoded and without a leading `&`.
pub fn pager(path: &str, page: u64, page_count: u64, size: u64, query: &str) -> Value {
    let link = |target: u64| {
        let mut href = format!("{path}?page={target}&size={size}");
        if !query.is_empty() {
            href.push('&');
            href.push_str(query);
        }
        href
    };

    json!({
        "page": page,
        "pageCount": page_count,
        "size": size,
        "previous": (page > 1).then(|| link(page - 1)),
        "next": (page < page_count).then(|| link(page + 1)),
        "sizes": ([10, 20, 50, 100].iter().map(|s| json!({"value": s, "selected": *s == size})).collect::<Vec<_>>()),
    })
}
