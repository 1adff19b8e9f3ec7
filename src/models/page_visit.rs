use serde::{Deserialize, Serialize};

use super::{de_id, de_null_default, de_opt_number};
use crate::format::{french_datetime, minutes_seconds};

/// Minimal user block embedded in visit and watch records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityUser {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub last_name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub email: String,
}

impl ActivityUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A page visit with its user, from `/page-visits/all-with-users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageVisit {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(alias = "url", deserialize_with = "de_null_default")]
    pub page_url: String,
    #[serde(deserialize_with = "de_opt_number")]
    pub time_spent: Option<f64>,
    #[serde(deserialize_with = "de_null_default")]
    pub created_at: String,
    #[serde(deserialize_with = "de_null_default")]
    pub user: ActivityUser,
}

/// Display-ready page visit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedPageVisit {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    pub page_url: String,
    pub time_spent: Option<f64>,
    pub time_spent_formatted: String,
    pub date_visited: String,
    /// ISO timestamp kept for sorting
    pub created_at: String,
}

impl From<&PageVisit> for FormattedPageVisit {
    fn from(visit: &PageVisit) -> Self {
        FormattedPageVisit {
            id: visit.id.clone(),
            user_id: visit.user_id.clone(),
            user_name: visit.user.full_name(),
            first_name: visit.user.first_name.clone(),
            last_name: visit.user.last_name.clone(),
            user_email: visit.user.email.clone(),
            page_url: visit.page_url.clone(),
            time_spent: visit.time_spent,
            time_spent_formatted: minutes_seconds(visit.time_spent),
            date_visited: french_datetime(&visit.created_at),
            created_at: visit.created_at.clone(),
        }
    }
}

pub fn format_page_visits(visits: &[PageVisit]) -> Vec<FormattedPageVisit> {
    visits.iter().map(FormattedPageVisit::from).collect()
}
