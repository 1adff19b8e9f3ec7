use std::sync::Arc;

use axum::{
    Router,
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::auth::{redirect_signed_in, require_staff};
use crate::config::Config;
use crate::state::AppState;
use crate::views::{activity, auth, dashboard, participants, profile, users};

/// Builds the full application router
///
/// Dashboard pages sit behind [`require_staff`], the login and registration
/// pages behind [`redirect_signed_in`], and the JSON proxy is nested under
/// `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/register", get(auth::register_page).post(auth::register_submit))
        .route_layer(middleware::from_fn(redirect_signed_in));

    let pages = Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/dashboard/participants", get(participants::list))
        .route("/dashboard/participants/:id", get(participants::detail))
        .route("/dashboard/users", get(users::list))
        .route("/dashboard/users/new", get(users::new_form).post(users::create))
        .route("/dashboard/users/:id/edit", get(users::edit_form_page).post(users::update))
        .route("/dashboard/users/:id/delete", get(users::delete_confirm).post(users::delete))
        .route("/dashboard/page-visits", get(activity::page_visits))
        .route("/dashboard/video-watches", get(activity::video_watches))
        .route("/dashboard/profile", get(profile::show).post(profile::update))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    Router::new()
        .route("/", get(auth::root))
        .route("/logout", post(auth::logout))
        .merge(public)
        .merge(pages)
        .nest("/api", api::router())
        .route("/static/style.css", get(stylesheet))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("./static/style.css"),
    )
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.address();
    info!(backend = %config.api_url, "starting dashboard server");

    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
