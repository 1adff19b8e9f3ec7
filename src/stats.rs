use serde::Serialize;

use crate::format::truncate;
use crate::models::{Attendance, FormattedPageVisit, FormattedVideoWatch, User};

/// Label widths used when charts and reports list pages or videos
pub const CHART_PAGE_LABEL: usize = 30;
pub const CHART_VIDEO_LABEL: usize = 25;
pub const REPORT_PAGE_LABEL: usize = 50;
pub const REPORT_VIDEO_LABEL: usize = 40;

/// A page or video with how often it appears
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub key: String,
    /// Author, for videos
    pub author: Option<String>,
    pub count: u64,
}

impl Ranked {
    pub fn label(&self, width: usize) -> String {
        truncate(&self.key, width)
    }
}

fn rank<'a>(items: impl Iterator<Item = (&'a str, Option<&'a str>)>, limit: usize) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = Vec::new();
    for (key, author) in items {
        match ranked.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => {
                entry.count += 1;
                if let Some(author) = author {
                    entry.author = Some(author.to_string());
                }
            }
            None => ranked.push(Ranked {
                key: key.to_string(),
                author: author.map(str::to_string),
                count: 1,
            }),
        }
    }
    // stable: ties keep first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

pub fn top_pages(visits: &[FormattedPageVisit], limit: usize) -> Vec<Ranked> {
    rank(visits.iter().map(|visit| (visit.page_url.as_str(), None)), limit)
}

pub fn top_videos(watches: &[FormattedVideoWatch], limit: usize) -> Vec<Ranked> {
    rank(
        watches
            .iter()
            .map(|watch| (watch.video_id.as_str(), Some(watch.auteur.as_str()))),
        limit,
    )
}

/// Completed viewings over all viewings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completion {
    pub completed: u64,
    pub total: u64,
    /// Percentage rounded to one decimal, 0 when nothing was watched
    pub rate: f64,
}

impl Completion {
    pub fn rate_text(&self) -> String {
        format!("{:.1}", self.rate)
    }
}

pub fn completion(watches: &[FormattedVideoWatch]) -> Completion {
    let total = watches.len() as u64;
    let completed = watches.iter().filter(|watch| watch.completed).count() as u64;
    let rate = if total == 0 {
        0.0
    } else {
        (completed as f64 / total as f64 * 1000.0).round() / 10.0
    };
    Completion { completed, total, rate }
}

/// Counters shown above the participants table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStats {
    pub total: usize,
    pub online: usize,
    pub on_site: usize,
}

pub fn participant_stats(participants: &[&User]) -> ParticipantStats {
    participants.iter().fold(ParticipantStats::default(), |mut stats, user| {
        stats.total += 1;
        match user.attendance() {
            Attendance::Online => stats.online += 1,
            Attendance::OnSite => stats.on_site += 1,
            Attendance::Mixed => {}
        }
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageVisit, VideoWatch};
    use serde_json::json;

    fn visits(urls: &[&str]) -> Vec<FormattedPageVisit> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| {
                let visit: PageVisit =
                    serde_json::from_value(json!({"id": i, "pageUrl": url})).unwrap();
                FormattedPageVisit::from(&visit)
            })
            .collect()
    }

    fn watches(entries: &[(&str, bool)]) -> Vec<FormattedVideoWatch> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (video, completed))| {
                let watch: VideoWatch = serde_json::from_value(json!({
                    "id": i, "videoId": video, "completed": completed, "auteur": "Dr Ba"
                }))
                .unwrap();
                FormattedVideoWatch::from(&watch)
            })
            .collect()
    }

    #[test]
    fn pages_ranked_by_visits() {
        let ranked = top_pages(&visits(&["/a", "/b", "/b", "/c", "/b", "/a"]), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].key.as_str(), ranked[0].count), ("/b", 3));
        assert_eq!((ranked[1].key.as_str(), ranked[1].count), ("/a", 2));
    }

    #[test]
    fn videos_keep_author() {
        let ranked = top_videos(&watches(&[("v1", true), ("v2", false), ("v2", true)]), 10);
        assert_eq!(ranked[0].key, "v2");
        assert_eq!(ranked[0].author.as_deref(), Some("Dr Ba"));
    }

    #[test]
    fn completion_rate_rounds_to_one_decimal() {
        let rate = completion(&watches(&[("v", true), ("v", true), ("v", false)]));
        assert_eq!((rate.completed, rate.total), (2, 3));
        assert_eq!(rate.rate_text(), "66.7");
        assert_eq!(completion(&[]).rate, 0.0);
    }

    #[test]
    fn labels_are_truncated() {
        let ranked = top_pages(&visits(&["/formations/oncologie-thoracique/session-1"]), 1);
        assert_eq!(ranked[0].label(CHART_PAGE_LABEL), "/formations/oncologie-thoraciq...");
    }

    #[test]
    fn participant_counters() {
        let users: Vec<User> = vec![
            serde_json::from_value(json!({"id": 1, "participationMode": "online"})).unwrap(),
            serde_json::from_value(json!({"id": 2, "userJourney": [{"type": "onsite"}]})).unwrap(),
            serde_json::from_value(json!({"id": 3})).unwrap(),
        ];
        let refs: Vec<&User> = users.iter().collect();
        assert_eq!(
            participant_stats(&refs),
            ParticipantStats { total: 3, online: 1, on_site: 1 }
        );
    }
}
