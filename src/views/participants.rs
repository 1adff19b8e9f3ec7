use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use super::{Notice, page, pager, session_expired};
use crate::auth::CurrentUser;
use crate::filters::{DateRange, filter_participants};
use crate::format::{french_date, french_datetime};
use crate::models::{PageVisit, User, VideoWatch, format_page_visits, format_video_watches};
use crate::services::{self, typed};
use crate::state::AppState;
use crate::stats::participant_stats;
use crate::table::{PageInfo, PaginationState};

pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des participants";
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Filter and paging parameters of the participants list and its exports
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantsQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// `current-month` or `last-month`
    pub range: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
    #[serde(flatten)]
    pub notice: Notice,
}

impl ParticipantsQuery {
    /// Date range to apply; a quick range wins over explicit dates
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        match self.range.as_deref() {
            Some("current-month") => DateRange::current_month(today),
            Some("last-month") => DateRange::last_month(today),
            _ => DateRange::parse(self.date_from.as_deref(), self.date_to.as_deref()),
        }
    }
}

fn with_query(base: &str, query: &str) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// `/dashboard/participants`: counters, date filter, table and exports
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(query): Query<ParticipantsQuery>,
) -> Response {
    let path = "/dashboard/participants";
    let mut notice = query.notice.clone();

    let participants = match services::users::participants(&state.backend, &user.token).await {
        Ok(participants) => participants,
        Err(err) if err.is_unauthorized() => return session_expired(jar, path),
        Err(err) => {
            warn!(error = %err, "participants unavailable");
            notice.error = Some(err.message().unwrap_or(FALLBACK_MESSAGE).to_string());
            Vec::new()
        }
    };

    let today = Utc::now().date_naive();
    let range = query.date_range(today);
    let filtered = filter_participants(&participants, &range);
    let stats = participant_stats(&filtered);

    let paging = PaginationState::from_query(query.page.as_deref(), query.size.as_deref(), DEFAULT_PAGE_SIZE);
    let rows: Vec<_> = paging.slice(&filtered).iter().map(|user| user.participant_row()).collect();
    let info = PageInfo::new(filtered.len() as u64, paging.skip(), paging.take(), rows.len() as u64);
    let range_query = range.to_query();

    let data = json!({
        "layout": page(&user, path, "Participants", &notice),
        "stats": stats,
        "rows": rows,
        "total": info.total,
        "pager": pager(path, paging.page_number(), info.page_count(), paging.take(), &range_query),
        "filter": {
            "from": range.from.map(|d| d.to_string()),
            "to": range.to.map(|d| d.to_string()),
            "active": range.is_active(),
            "period": range.period_text(today),
        },
        "exports": {
            "pdf": with_query("/api/reports/participants.pdf", &range_query),
            "xlsx": with_query("/api/reports/participants.xlsx", &range_query),
        },
    });

    state.views.render("participants", &data)
}

fn detail_data(participant: &User) -> Value {
    let visits: Vec<PageVisit> = typed(participant.page_visits.clone()).unwrap_or_default();
    let watches: Vec<VideoWatch> = typed(participant.video_watches.clone()).unwrap_or_default();
    let journey: Vec<Value> = participant
        .user_journey
        .iter()
        .map(|entry| {
            json!({
                "kind": entry.kind,
                "when": entry.timestamp.as_deref().map(french_datetime).unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();

    json!({
        "participant": participant.participant_row(),
        "registered": participant.created_at.as_deref().map(french_date),
        "visits": format_page_visits(&visits),
        "watches": format_video_watches(&watches),
        "journey": journey,
    })
}

/// `/dashboard/participants/:id`
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(mut notice): Query<Notice>,
) -> Response {
    let path = format!("/dashboard/participants/{id}");

    let mut data = match services::users::get(&state.backend, &user.token, &id).await {
        Ok(participant) => detail_data(&participant),
        Err(err) if err.is_unauthorized() => return session_expired(jar, &path),
        Err(err) => {
            warn!(error = %err, id, "participant unavailable");
            notice.error = Some(err.message().unwrap_or(FALLBACK_MESSAGE).to_string());
            json!({ "missing": true })
        }
    };

    data["layout"] = page(&user, &path, "Fiche participant", &notice);
    state.views.render("participant", &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn quick_range_wins_over_dates() {
        let query = ParticipantsQuery {
            date_from: Some("2025-01-01".into()),
            date_to: Some("2025-01-31".into()),
            range: Some("last-month".into()),
            ..Default::default()
        };
        let range = query.date_range(day("2025-03-09"));
        assert_eq!(range.from, Some(day("2025-02-01")));
        assert_eq!(range.to, Some(day("2025-02-28")));
    }

    #[test]
    fn explicit_dates() {
        let query = ParticipantsQuery {
            date_from: Some("2025-01-01".into()),
            date_to: Some("2025-01-31".into()),
            ..Default::default()
        };
        assert_eq!(query.date_range(day("2025-03-09")).to_query(), "dateFrom=2025-01-01&dateTo=2025-01-31");
    }

    #[test]
    fn detail_formats_nested_activity() {
        let participant: User = serde_json::from_value(json!({
            "id": 9,
            "firstName": "Awa",
            "pageVisits": [{"id": 1, "pageUrl": "/programme", "timeSpent": 61}],
            "videoWatches": [{"id": 2, "videoId": "v1", "completed": true}],
            "userJourney": [{"type": "online", "timestamp": "2025-03-01T10:00:00Z"}]
        }))
        .unwrap();
        let data = detail_data(&participant);
        assert_eq!(data["visits"][0]["timeSpentFormatted"], "1m 1s");
        assert_eq!(data["watches"][0]["status"], "Complétée");
        assert_eq!(data["journey"][0]["when"], "01/03/2025 10:00:00");
    }
}
