//! JSON proxy routes under `/api`.
//!
//! Each handler forwards the caller's bearer token to the backend and maps
//! failures to [`AppError`](crate::error::AppError) with a French fallback
//! message for the route.

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod reports;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/users", get(users::list).post(users::create))
        .route("/users/admins", get(users::admins))
        .route(
            "/users/:id",
            get(users::show)
                .put(users::replace)
                .patch(users::update)
                .delete(users::remove),
        )
        .route("/page-visits", get(activity::page_visits))
        .route("/video-watches", get(activity::video_watches))
        .route("/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/reports/page-visits.pdf", get(reports::page_visits_pdf))
        .route("/reports/page-visits.xlsx", get(reports::page_visits_xlsx))
        .route("/reports/video-watches.pdf", get(reports::video_watches_pdf))
        .route("/reports/video-watches.xlsx", get(reports::video_watches_xlsx))
        .route("/reports/participants.pdf", get(reports::participants_pdf))
        .route("/reports/participants.xlsx", get(reports::participants_xlsx))
        .route("/reports/consent", post(reports::consent_bundle))
        .route("/reports/consent/:id", get(reports::consent_form))
}
