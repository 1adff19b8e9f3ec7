use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::BearerToken;
use crate::error::AppError;
use crate::services::{page_visits, video_watches};
use crate::state::AppState;
use crate::table::Page;

/// `skip`/`take` forwarded to the backend when they are numbers
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PagingQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
}

impl PagingQuery {
    fn parse(raw: &Option<String>) -> Option<u64> {
        raw.as_deref().and_then(|value| value.trim().parse().ok())
    }

    pub fn skip(&self) -> Option<u64> {
        Self::parse(&self.skip)
    }

    pub fn take(&self) -> Option<u64> {
        Self::parse(&self.take)
    }
}

/// `GET /api/page-visits`, home page visits removed
pub async fn page_visits(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<PagingQuery>,
) -> Result<Json<Page<Value>>, AppError> {
    let page = page_visits::fetch(&state.backend, token.as_str(), query.skip(), query.take())
        .await
        .map_err(|err| AppError::from_backend(err, page_visits::FALLBACK_MESSAGE))?;
    Ok(Json(page))
}

/// `GET /api/video-watches`
pub async fn video_watches(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<PagingQuery>,
) -> Result<Json<Page<Value>>, AppError> {
    let page = video_watches::fetch(&state.backend, token.as_str(), query.skip(), query.take())
        .await
        .map_err(|err| AppError::from_backend(err, video_watches::FALLBACK_MESSAGE))?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_paging_is_dropped() {
        let query = PagingQuery { skip: Some("40".into()), take: Some("abc".into()) };
        assert_eq!(query.skip(), Some(40));
        assert_eq!(query.take(), None);
    }
}
