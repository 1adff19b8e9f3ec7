use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use super::dashboard::chart_svg;
use super::{Notice, page, pager, session_expired};
use crate::auth::CurrentUser;
use crate::charts;
use crate::services::{page_visits, video_watches};
use crate::state::AppState;
use crate::table::{PaginationState, SortingState, sort_rows};

const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Option<String>,
    #[serde(flatten)]
    pub notice: Notice,
}

/// Sortable column headers of a table
fn headers(path: &str, paging: &PaginationState, sorting: &SortingState, columns: &[(&str, &str)]) -> Vec<Value> {
    columns
        .iter()
        .map(|(id, label)| {
            let indicator = match (sorting.id == *id, sorting.desc) {
                (true, true) => "▼",
                (true, false) => "▲",
                _ => "",
            };
            json!({
                "label": label,
                "indicator": indicator,
                "href": format!(
                    "{path}?page={}&size={}&sort={}",
                    paging.page_number(),
                    paging.take(),
                    urlencoding::encode(&sorting.toggle_for(id))
                ),
            })
        })
        .collect()
}

const VISIT_COLUMNS: [(&str, &str); 6] = [
    ("id", "ID"),
    ("userName", "Utilisateur"),
    ("userEmail", "Email"),
    ("pageUrl", "URL de la page"),
    ("timeSpent", "Temps passé"),
    ("createdAt", "Date de visite"),
];

/// `/dashboard/page-visits`
pub async fn page_visits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(query): Query<TableQuery>,
) -> Response {
    let path = "/dashboard/page-visits";
    let mut notice = query.notice.clone();
    let paging = PaginationState::from_query(query.page.as_deref(), query.size.as_deref(), DEFAULT_PAGE_SIZE);
    let sorting = SortingState::parse(query.sort.as_deref(), SortingState::desc("createdAt"));

    let (rows, total, page_count) =
        match page_visits::fetch_formatted(&state.backend, &user.token, Some(paging.skip()), Some(paging.take())).await {
            Ok(mut page) => {
                sort_rows(&mut page.data, &sorting);
                (page.data, page.pagination.total, page.pagination.page_count())
            }
            Err(err) if err.is_unauthorized() => return session_expired(jar, path),
            Err(err) => {
                warn!(error = %err, "page visits unavailable");
                notice.error = Some(err.message().unwrap_or(page_visits::FALLBACK_MESSAGE).to_string());
                (Vec::new(), 0, 1)
            }
        };

    let chart = match page_visits::fetch_all(&state.backend, &user.token).await {
        Ok(all) => chart_svg(charts::page_visits_chart(&all), "page-visits"),
        Err(err) => {
            warn!(error = %err, "page visits chart skipped");
            None
        }
    };

    let sort_query = format!("sort={}", urlencoding::encode(&sorting.to_param()));
    let data = json!({
        "layout": page(&user, path, "Visites de Pages", &notice),
        "headers": headers(path, &paging, &sorting, &VISIT_COLUMNS),
        "rows": rows,
        "total": total,
        "pager": pager(path, paging.page_number(), page_count, paging.take(), &sort_query),
        "chart": chart,
        "noData": charts::NO_DATA,
        "exports": {
            "pdf": "/api/reports/page-visits.pdf",
            "xlsx": "/api/reports/page-visits.xlsx",
        },
    });
    state.views.render("page_visits", &data)
}

const WATCH_COLUMNS: [(&str, &str); 8] = [
    ("id", "ID"),
    ("userName", "Utilisateur"),
    ("videoId", "ID Vidéo"),
    ("auteur", "Auteur"),
    ("duration", "Durée"),
    ("progress", "Progression"),
    ("completed", "Statut"),
    ("dateVisualisation", "Date"),
];

/// `/dashboard/video-watches`
pub async fn video_watches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(query): Query<TableQuery>,
) -> Response {
    let path = "/dashboard/video-watches";
    let mut notice = query.notice.clone();
    let paging = PaginationState::from_query(query.page.as_deref(), query.size.as_deref(), DEFAULT_PAGE_SIZE);
    let sorting = SortingState::parse(query.sort.as_deref(), SortingState::desc("dateVisualisation"));

    let (rows, total, page_count) =
        match video_watches::fetch_formatted(&state.backend, &user.token, Some(paging.skip()), Some(paging.take())).await {
            Ok(mut page) => {
                sort_rows(&mut page.data, &sorting);
                (page.data, page.pagination.total, page.pagination.page_count())
            }
            Err(err) if err.is_unauthorized() => return session_expired(jar, path),
            Err(err) => {
                warn!(error = %err, "video watches unavailable");
                notice.error = Some(err.message().unwrap_or(video_watches::FALLBACK_MESSAGE).to_string());
                (Vec::new(), 0, 1)
            }
        };

    let chart = match video_watches::fetch_all(&state.backend, &user.token).await {
        Ok(all) => chart_svg(charts::video_watches_chart(&all), "video-watches"),
        Err(err) => {
            warn!(error = %err, "video watches chart skipped");
            None
        }
    };

    let sort_query = format!("sort={}", urlencoding::encode(&sorting.to_param()));
    let data = json!({
        "layout": page(&user, path, "Vidéos Regardées", &notice),
        "headers": headers(path, &paging, &sorting, &WATCH_COLUMNS),
        "rows": rows,
        "total": total,
        "pager": pager(path, paging.page_number(), page_count, paging.take(), &sort_query),
        "chart": chart,
        "noData": charts::NO_DATA,
        "exports": {
            "pdf": "/api/reports/video-watches.pdf",
            "xlsx": "/api/reports/video-watches.xlsx",
        },
    });
    state.views.render("video_watches", &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_toggle_active_column() {
        let paging = PaginationState::new(1, 20);
        let sorting = SortingState { id: "pageUrl".into(), desc: false };
        let headers = headers("/dashboard/page-visits", &paging, &sorting, &VISIT_COLUMNS);
        assert_eq!(headers[3]["indicator"], "▲");
        assert_eq!(headers[3]["href"], "/dashboard/page-visits?page=2&size=20&sort=-pageUrl");
        assert_eq!(headers[0]["href"], "/dashboard/page-visits?page=2&size=20&sort=id");
    }
}
