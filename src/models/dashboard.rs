use serde::{Deserialize, Serialize};

use super::{de_null_default, de_number, de_text};
use crate::format::number;

/// Payload of the backend `/dashboard` endpoint
///
/// Every field defaults so a partial payload still renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardData {
    #[serde(deserialize_with = "de_null_default")]
    pub metrics: DashboardMetrics,
    #[serde(deserialize_with = "de_null_default")]
    pub recent_activities: Vec<RecentActivity>,
    #[serde(deserialize_with = "de_null_default")]
    pub temporal_data: TemporalData,
    #[serde(deserialize_with = "de_null_default")]
    pub geo_data: Vec<GeoData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    #[serde(deserialize_with = "de_number")]
    pub total_users: f64,
    #[serde(deserialize_with = "de_number")]
    pub total_participants: f64,
    #[serde(deserialize_with = "de_number")]
    pub nbre_participant_enligne: f64,
    #[serde(deserialize_with = "de_number")]
    pub nbre_participant_presentiel: f64,
    #[serde(deserialize_with = "de_number")]
    pub new_users_this_month: f64,
    #[serde(deserialize_with = "de_text")]
    pub user_growth_rate: Option<String>,
    #[serde(deserialize_with = "de_number")]
    pub active_users7d: f64,
    #[serde(deserialize_with = "de_number")]
    pub active_users30d: f64,
    #[serde(deserialize_with = "de_text")]
    pub avg_session_time: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub engagement_rate: Option<String>,
    #[serde(deserialize_with = "de_number")]
    pub total_page_views: f64,
    #[serde(deserialize_with = "de_number")]
    pub total_video_views: f64,
    #[serde(deserialize_with = "de_text")]
    pub avg_video_completion: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub gdpr_consent_rate: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub users_by_role: Vec<RoleCount>,
    #[serde(deserialize_with = "de_null_default")]
    pub top_videos: Vec<TopVideo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCount {
    #[serde(deserialize_with = "de_null_default")]
    pub role: String,
    #[serde(deserialize_with = "de_number")]
    pub count: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopVideo {
    #[serde(deserialize_with = "de_text")]
    pub video_id: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub auteur: String,
    #[serde(deserialize_with = "de_number")]
    pub views: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentActivity {
    #[serde(rename = "type", deserialize_with = "de_null_default")]
    pub kind: String,
    #[serde(deserialize_with = "de_null_default")]
    pub description: String,
    #[serde(deserialize_with = "de_text")]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub user: ActivityAuthor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityAuthor {
    #[serde(deserialize_with = "de_null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemporalData {
    #[serde(deserialize_with = "de_null_default")]
    pub registrations: Vec<DatePoint>,
    #[serde(deserialize_with = "de_null_default")]
    pub logins: Vec<DatePoint>,
    #[serde(deserialize_with = "de_null_default")]
    pub page_views: Vec<DatePoint>,
    #[serde(deserialize_with = "de_null_default")]
    pub video_views: Vec<DatePoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatePoint {
    #[serde(deserialize_with = "de_null_default")]
    pub date: String,
    #[serde(deserialize_with = "de_number")]
    pub count: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoData {
    #[serde(deserialize_with = "de_null_default")]
    pub country: String,
    #[serde(deserialize_with = "de_number")]
    pub users: f64,
}

/// A KPI card on the dashboard home
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub title: &'static str,
    pub value: String,
}

fn text_or_dash(value: &Option<String>) -> String {
    value.clone().filter(|text| !text.is_empty()).unwrap_or_else(|| "-".to_string())
}

impl DashboardData {
    pub fn kpis(&self) -> Vec<Kpi> {
        let m = &self.metrics;
        vec![
            Kpi { title: "Utilisateurs Totaux", value: number(m.total_users) },
            Kpi { title: "Participants", value: number(m.total_participants) },
            Kpi { title: "Participants en ligne", value: number(m.nbre_participant_enligne) },
            Kpi { title: "Participants en présentiel", value: number(m.nbre_participant_presentiel) },
            Kpi { title: "Nouveaux ce mois", value: number(m.new_users_this_month) },
            Kpi { title: "Actifs (7 jours)", value: number(m.active_users7d) },
            Kpi { title: "Temps Moyen de Session", value: text_or_dash(&m.avg_session_time) },
            Kpi { title: "Pages Vues", value: number(m.total_page_views) },
            Kpi { title: "Vidéos Vues", value: number(m.total_video_views) },
            Kpi { title: "Taux d'Engagement", value: text_or_dash(&m.engagement_rate) },
        ]
    }

    /// Page views summed per month (`YYYY-MM`), oldest first
    pub fn monthly_page_views(&self) -> Vec<(String, f64)> {
        let mut months: Vec<(String, f64)> = Vec::new();
        for point in &self.temporal_data.page_views {
            let month: String = point.date.chars().take(7).collect();
            if month.len() < 7 {
                continue;
            }
            match months.iter_mut().find(|(key, _)| *key == month) {
                Some((_, total)) => *total += point.count,
                None => months.push((month, point.count)),
            }
        }
        months.sort_by(|a, b| a.0.cmp(&b.0));
        months
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_payload_renders() {
        let data: DashboardData =
            serde_json::from_value(json!({"metrics": {"totalUsers": 12, "avgSessionTime": null}}))
                .unwrap();
        let kpis = data.kpis();
        assert_eq!(kpis[0].value, "12");
        assert_eq!(kpis[6].value, "-");
        assert!(data.geo_data.is_empty());
    }

    #[test]
    fn page_views_are_grouped_by_month() {
        let data: DashboardData = serde_json::from_value(json!({
            "temporalData": {"pageViews": [
                {"date": "2025-02-10", "count": 4},
                {"date": "2025-01-03", "count": 1},
                {"date": "2025-02-11", "count": "2"},
                {"date": "", "count": 9}
            ]}
        }))
        .unwrap();
        assert_eq!(
            data.monthly_page_views(),
            vec![("2025-01".to_string(), 1.0), ("2025-02".to_string(), 6.0)]
        );
    }
}
