use std::cmp::Ordering;

use serde_json::Value;

use super::{normalize_list, paging_query, typed};
use crate::backend::{BackendClient, BackendError};
use crate::models::{FormattedVideoWatch, VideoWatch, format_video_watches};
use crate::table::{Page, SortableRow, compare_id, compare_opt_f64, compare_text};

pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des vidéos regardées";

/// One page of watches, as returned by `GET /api/video-watches`
pub async fn fetch(
    backend: &BackendClient,
    token: &str,
    skip: Option<u64>,
    take: Option<u64>,
) -> Result<Page<Value>, BackendError> {
    let response = backend
        .get(Some(token), "/video-watches/all-with-users", &paging_query(skip, take))
        .await?;

    normalize_list(response.body, "videoWatches", response.total_count, skip, take)
}

pub async fn fetch_formatted(
    backend: &BackendClient,
    token: &str,
    skip: Option<u64>,
    take: Option<u64>,
) -> Result<Page<FormattedVideoWatch>, BackendError> {
    let page = fetch(backend, token, skip, take).await?;
    let watches: Vec<VideoWatch> = typed(page.data)?;

    Ok(Page {
        data: format_video_watches(&watches),
        pagination: page.pagination,
    })
}

pub async fn fetch_all(backend: &BackendClient, token: &str) -> Result<Vec<FormattedVideoWatch>, BackendError> {
    Ok(fetch_formatted(backend, token, None, None).await?.data)
}

impl SortableRow for FormattedVideoWatch {
    fn compare(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "id" => compare_id(&self.id, &other.id),
            "userName" => compare_text(&self.user_name, &other.user_name),
            "videoId" => compare_text(&self.video_id, &other.video_id),
            "auteur" => compare_text(&self.auteur, &other.auteur),
            "duration" => compare_opt_f64(self.duration, other.duration),
            "progress" => compare_opt_f64(self.progress, other.progress),
            "completed" => self.completed.cmp(&other.completed),
            _ => self.date_visualisation_iso.cmp(&other.date_visualisation_iso),
        }
    }
}
