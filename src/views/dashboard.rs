use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};
use tracing::warn;

use super::{Notice, page, session_expired};
use crate::auth::CurrentUser;
use crate::charts;
use crate::format::french_datetime;
use crate::models::DashboardData;
use crate::services::dashboard::{self, FALLBACK_MESSAGE};
use crate::state::AppState;

/// Chart markup, or `None` when the chart is empty or failed to draw
pub(crate) fn chart_svg(result: Result<Option<String>, Box<dyn std::error::Error>>, name: &str) -> Option<String> {
    match result {
        Ok(svg) => svg,
        Err(e) => {
            warn!(chart = name, error = %e, "chart rendering failed");
            None
        }
    }
}

fn dashboard_data(data: &DashboardData) -> Value {
    let activities: Vec<Value> = data
        .recent_activities
        .iter()
        .map(|activity| {
            json!({
                "description": activity.description,
                "kind": activity.kind,
                "user": format!("{} {}", activity.user.first_name, activity.user.last_name).trim().to_string(),
                "when": activity.timestamp.as_deref().map(french_datetime).unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();

    json!({
        "kpis": data.kpis(),
        "activityChart": chart_svg(charts::activity_chart(data), "activity"),
        "geoChart": chart_svg(charts::geo_chart(data), "geo"),
        "noData": charts::NO_DATA,
        "activities": activities,
        "topVideos": data.metrics.top_videos,
        "usersByRole": data.metrics.users_by_role,
    })
}

/// `/dashboard`: KPI cards and charts
pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Query(mut notice): Query<Notice>,
) -> Response {
    let path = "/dashboard";
    let mut data = match dashboard::fetch(&state.backend, &user.token).await {
        Ok(metrics) => dashboard_data(&metrics),
        Err(err) if err.is_unauthorized() => return session_expired(jar, path),
        Err(err) => {
            warn!(error = %err, "dashboard metrics unavailable");
            notice.error = Some(err.message().unwrap_or(FALLBACK_MESSAGE).to_string());
            json!({ "failed": true, "noData": charts::NO_DATA })
        }
    };

    data["layout"] = page(&user, path, "Tableau de bord", &notice);
    state.views.render("dashboard", &data)
}
