use std::time::Duration;

use axum::http::{StatusCode, header};
use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Failures talking to the backend REST API
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("backend answered {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// The backend answered with a non-success status and a body that is not JSON
    #[error("backend answered {status} without a json body")]
    UnreadableStatus { status: StatusCode },

    /// The request never got an answer (connection refused, timeout, ...)
    #[error("backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered 2xx with something that is not JSON
    #[error("invalid backend response: {0}")]
    InvalidBody(String),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } | BackendError::UnreadableStatus { status } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Message sent by the backend, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Successful backend answer
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,

    /// Value of the `X-Total-Count` header used by list endpoints
    pub total_count: Option<u64>,

    /// Parsed JSON body, `Null` for empty answers
    pub body: Value,
}

/// Thin JSON client for the backend
///
/// Each call carries the caller's bearer token and a fresh `X-Request-Id`
/// so backend logs can be matched with ours.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(
        &self,
        token: Option<&str>,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<BackendResponse, BackendError> {
        self.send(Method::GET, token, path, query, None).await
    }

    pub async fn post(
        &self,
        token: Option<&str>,
        path: &str,
        body: &Value,
    ) -> Result<BackendResponse, BackendError> {
        self.send(Method::POST, token, path, &[], Some(body)).await
    }

    pub async fn put(
        &self,
        token: Option<&str>,
        path: &str,
        body: &Value,
    ) -> Result<BackendResponse, BackendError> {
        self.send(Method::PUT, token, path, &[], Some(body)).await
    }

    pub async fn patch(
        &self,
        token: Option<&str>,
        path: &str,
        body: &Value,
    ) -> Result<BackendResponse, BackendError> {
        self.send(Method::PATCH, token, path, &[], Some(body)).await
    }

    pub async fn delete(
        &self,
        token: Option<&str>,
        path: &str,
    ) -> Result<BackendResponse, BackendError> {
        self.send(Method::DELETE, token, path, &[], None).await
    }

    async fn send(
        &self,
        method: Method,
        token: Option<&str>,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<BackendResponse, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("X-Request-Id", &request_id)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%request_id, %method, path, error = %e, "backend unreachable");
            BackendError::Network(e)
        })?;

        let status = response.status();
        let total_count = response
            .headers()
            .get("x-total-count")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());
        let text = response.text().await?;

        info!(%request_id, %method, path, status = status.as_u16(), "backend call");

        let parsed = if text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&text)
        };

        if !status.is_success() {
            let Ok(body) = parsed else {
                debug!(%request_id, "backend error body is not json");
                return Err(BackendError::UnreadableStatus { status });
            };
            let message = error_message(&body);
            debug!(%request_id, ?message, "backend error body");
            return Err(BackendError::Status { status, message });
        }

        let body = parsed.map_err(|e| BackendError::InvalidBody(e.to_string()))?;

        Ok(BackendResponse {
            status,
            total_count,
            body,
        })
    }
}

/// Extracts `message` (string or list of strings) or `error` from an error body
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("message") {
        Some(Value::String(message)) if !message.is_empty() => return Some(message.clone()),
        Some(Value::Array(items)) if !items.is_empty() => {
            let joined: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if !joined.is_empty() {
                return Some(joined.join(", "));
            }
        }
        _ => {}
    }

    body.get("error")
        .and_then(Value::as_str)
        .filter(|error| !error.is_empty())
        .map(str::to_string)
}
