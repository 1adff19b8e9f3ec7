use serde_json::Value;

use crate::backend::{BackendClient, BackendError};
use crate::models::DashboardData;

pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des données";

pub async fn fetch_raw(backend: &BackendClient, token: &str) -> Result<Value, BackendError> {
    Ok(backend.get(Some(token), "/dashboard", &[]).await?.body)
}

pub async fn fetch(backend: &BackendClient, token: &str) -> Result<DashboardData, BackendError> {
    let body = fetch_raw(backend, token).await?;
    serde_json::from_value(body).map_err(|e| BackendError::InvalidBody(e.to_string()))
}
