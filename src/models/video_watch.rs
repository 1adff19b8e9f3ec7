use serde::{Deserialize, Serialize};

use super::{ActivityUser, de_id, de_null_default, de_opt_number};
use crate::format::{french_datetime, minutes_seconds, number};

/// A video viewing session with its user, from `/video-watches/all-with-users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoWatch {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(deserialize_with = "de_id")]
    pub video_id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub start_time: String,
    pub end_time: Option<String>,
    #[serde(deserialize_with = "de_opt_number")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "de_opt_number")]
    pub progress: Option<f64>,
    #[serde(deserialize_with = "de_null_default")]
    pub completed: bool,
    #[serde(deserialize_with = "de_null_default")]
    pub auteur: String,
    #[serde(deserialize_with = "de_null_default")]
    pub date_visualisation: String,
    #[serde(deserialize_with = "de_null_default")]
    pub user: ActivityUser,
}

/// Display-ready video watch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedVideoWatch {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    pub video_id: String,
    pub auteur: String,
    pub duration: Option<f64>,
    pub duration_formatted: String,
    pub progress: Option<f64>,
    pub progress_formatted: String,
    pub completed: bool,
    pub completed_formatted: String,
    pub status: String,
    pub date_visualisation: String,
    pub start_time: String,
    /// ISO timestamp kept for sorting
    pub date_visualisation_iso: String,
}

impl From<&VideoWatch> for FormattedVideoWatch {
    fn from(watch: &VideoWatch) -> Self {
        let (completed_formatted, status) = if watch.completed {
            ("✅ Complétée", "Complétée")
        } else {
            ("⏸️ En cours", "En cours")
        };

        FormattedVideoWatch {
            id: watch.id.clone(),
            user_id: watch.user_id.clone(),
            user_name: watch.user.full_name(),
            first_name: watch.user.first_name.clone(),
            last_name: watch.user.last_name.clone(),
            user_email: watch.user.email.clone(),
            video_id: watch.video_id.clone(),
            auteur: watch.auteur.clone(),
            duration: watch.duration,
            duration_formatted: minutes_seconds(watch.duration),
            progress: watch.progress,
            progress_formatted: watch
                .progress
                .map(|progress| format!("{}%", number(progress)))
                .unwrap_or_else(|| "N/A".to_string()),
            completed: watch.completed,
            completed_formatted: completed_formatted.to_string(),
            status: status.to_string(),
            date_visualisation: french_datetime(&watch.date_visualisation),
            start_time: french_datetime(&watch.start_time),
            date_visualisation_iso: watch.date_visualisation.clone(),
        }
    }
}

pub fn format_video_watches(watches: &[VideoWatch]) -> Vec<FormattedVideoWatch> {
    watches.iter().map(FormattedVideoWatch::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_completed_watch() {
        let watch: VideoWatch = serde_json::from_value(json!({
            "id": 4,
            "userId": 2,
            "videoId": "keynote-2025",
            "startTime": "2025-04-01T08:00:00Z",
            "duration": 145,
            "progress": 100,
            "completed": true,
            "auteur": "Pr Ndiaye",
            "dateVisualisation": "2025-04-01T08:02:25Z",
            "user": {"id": 2, "firstName": "Moussa", "lastName": "Fall", "email": "m@f.sn"}
        }))
        .unwrap();

        let formatted = FormattedVideoWatch::from(&watch);
        assert_eq!(formatted.duration_formatted, "2m 25s");
        assert_eq!(formatted.progress_formatted, "100%");
        assert_eq!(formatted.completed_formatted, "✅ Complétée");
        assert_eq!(formatted.start_time, "01/04/2025 08:00:00");
    }

    #[test]
    fn pending_watch_without_figures() {
        let watch: VideoWatch = serde_json::from_value(json!({
            "id": "5",
            "videoId": 12,
            "completed": false,
            "progress": null
        }))
        .unwrap();

        let formatted = FormattedVideoWatch::from(&watch);
        assert_eq!(formatted.video_id, "12");
        assert_eq!(formatted.progress_formatted, "N/A");
        assert_eq!(formatted.duration_formatted, "N/A");
        assert_eq!(formatted.status, "En cours");
    }
}
