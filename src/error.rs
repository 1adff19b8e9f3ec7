use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::forms::ValidationErrors;
use crate::report::ReportError;

/// Message returned when a request carries no `auth_token`
pub const MISSING_TOKEN: &str = "Token d'authentification manquant";

/// Errors returned by the `/api` proxy routes
///
/// Every variant renders as `{"error": "<message>"}` with the matching status,
/// which is the shape the dashboard pages and the exports expect.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    /// Form data refused before reaching the backend
    #[error("{}", .0.first().unwrap_or("Données invalides"))]
    Invalid(#[from] ValidationErrors),

    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    #[error("Erreur lors de la génération du document")]
    Report(#[from] ReportError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_token() -> Self {
        AppError::Unauthorized(MISSING_TOKEN.to_string())
    }

    /// Maps a backend failure, keeping the backend status and message when
    /// there is one and falling back to `fallback` otherwise
    pub fn from_backend(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Status { status, message } => AppError::Backend {
                status,
                message: message.unwrap_or_else(|| fallback.to_string()),
            },
            BackendError::UnreadableStatus { status } => AppError::Backend {
                status,
                message: fallback.to_string(),
            },
            BackendError::Network(_) | BackendError::InvalidBody(_) => AppError::Backend {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: fallback.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Backend { status, .. } => *status,
            AppError::Report(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = ?self, "request failed");
        }

        let body = match &self {
            AppError::Invalid(errors) => json!({ "error": self.to_string(), "fields": errors.fields }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_wins_over_fallback() {
        let err = AppError::from_backend(
            BackendError::Status {
                status: StatusCode::FORBIDDEN,
                message: Some("Forbidden resource".into()),
            },
            "Erreur lors de la récupération des données",
        );
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Forbidden resource");
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let errors = crate::forms::LoginForm::default().validate().unwrap_err();
        let err = AppError::from(errors);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "L'email est requis");
    }

    #[test]
    fn transport_failure_becomes_generic_500() {
        let err = AppError::from_backend(
            BackendError::InvalidBody("<html>".into()),
            "Erreur lors de la récupération des données",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Erreur lors de la récupération des données");
    }

    #[test]
    fn unreadable_error_keeps_the_backend_status() {
        let err = AppError::from_backend(
            BackendError::UnreadableStatus { status: StatusCode::BAD_GATEWAY },
            "Erreur lors de la récupération des données",
        );
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Erreur lors de la récupération des données");
    }
}
