use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{de_id, de_null_default};
use crate::auth::Role;
use crate::format::{french_date, french_datetime, parse_timestamp};

/// Account record returned by `/users`, `/users/:id` and `/auth/me`
///
/// System users and participants share the same shape; participants are the
/// records whose role is `USER`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub email: String,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub specialty: Option<String>,
    pub workplace: Option<String>,
    pub participation_mode: Option<String>,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub role: Role,
    #[serde(deserialize_with = "de_null_default")]
    pub page_visits: Vec<Value>,
    #[serde(deserialize_with = "de_null_default")]
    pub video_watches: Vec<Value>,
    #[serde(deserialize_with = "de_null_default")]
    pub user_journey: Vec<JourneyEntry>,
}

/// One step of a participant's journey (`online`, `onsite`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyEntry {
    #[serde(rename = "type", deserialize_with = "de_null_default")]
    pub kind: String,
    pub timestamp: Option<String>,
}

/// How a participant attends the forum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    Online,
    OnSite,
    Mixed,
}

impl Attendance {
    pub fn label(self) -> &'static str {
        match self {
            Attendance::Online => "EN LIGNE",
            Attendance::OnSite => "EN PRÉSENTIEL",
            Attendance::Mixed => "MIXTE",
        }
    }

    fn from_keyword(raw: &str) -> Option<Attendance> {
        match raw.trim().to_lowercase().as_str() {
            "online" | "en ligne" | "en_ligne" => Some(Attendance::Online),
            "onsite" | "on_site" | "in_person" | "présentiel" | "presentiel" | "en présentiel" => {
                Some(Attendance::OnSite)
            }
            _ => None,
        }
    }
}

fn upper(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_uppercase()
}

impl User {
    /// `Prénom Nom`, trimmed
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn is_participant(&self) -> bool {
        self.role == Role::User
    }

    /// Attendance derived from the explicit mode, else from the journey
    pub fn attendance(&self) -> Attendance {
        if let Some(mode) = self.participation_mode.as_deref().filter(|m| !m.trim().is_empty()) {
            return Attendance::from_keyword(mode).unwrap_or(Attendance::Mixed);
        }

        let kinds: Vec<Option<Attendance>> = self
            .user_journey
            .iter()
            .map(|entry| Attendance::from_keyword(&entry.kind))
            .collect();
        if kinds.contains(&Some(Attendance::Online)) {
            Attendance::Online
        } else if kinds.contains(&Some(Attendance::OnSite)) {
            Attendance::OnSite
        } else {
            Attendance::Mixed
        }
    }

    /// Text of the "Mode de participation" column
    ///
    /// An explicit mode is shown upper-cased as sent; otherwise the journey
    /// decides between `EN LIGNE`, `EN PRÉSENTIEL` and `MIXTE`.
    pub fn participation_label(&self) -> String {
        match self.participation_mode.as_deref().map(str::trim) {
            Some(mode) if !mode.is_empty() => mode.to_uppercase(),
            _ => self.attendance().label().to_string(),
        }
    }

    /// Most recent journey timestamp, as sent by the backend
    pub fn last_activity(&self) -> Option<&str> {
        self.user_journey
            .iter()
            .filter_map(|entry| {
                let raw = entry.timestamp.as_deref()?;
                parse_timestamp(raw).map(|date| (date, raw))
            })
            .max_by_key(|(date, _)| *date)
            .map(|(_, raw)| raw)
    }

    /// Row shown in the participants table and exports
    pub fn participant_row(&self) -> ParticipantRow {
        ParticipantRow {
            id: self.id.clone(),
            title: upper(&self.title),
            name: self.full_name().to_uppercase(),
            first_name: self.first_name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            email: self.email.trim().to_lowercase(),
            phone: upper(&self.phone_number),
            country: upper(&self.country),
            specialty: upper(&self.specialty),
            workplace: self.workplace.clone().unwrap_or_default(),
            mode: self.participation_label(),
            videos_seen: self.video_watches.len(),
            last_activity: self
                .last_activity()
                .map(french_datetime)
                .unwrap_or_else(|| "-".to_string()),
            registered: self
                .created_at
                .as_deref()
                .map(french_date)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Display-ready participant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRow {
    pub id: String,
    pub title: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub specialty: String,
    pub workplace: String,
    pub mode: String,
    pub videos_seen: usize,
    pub last_activity: String,
    pub registered: String,
}

/// System user as shown in the users table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub role_label: String,
    pub role_color: &'static str,
    pub created: String,
}

impl From<&User> for SystemUserRow {
    fn from(user: &User) -> Self {
        SystemUserRow {
            id: user.id.clone(),
            name: user.full_name(),
            email: user.email.clone(),
            role: user.role.to_string(),
            role_label: user.role.label().to_string(),
            role_color: user.role.color(),
            created: user
                .created_at
                .as_deref()
                .map(french_date)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn participant(value: Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_role_is_not_a_participant() {
        let user = participant(json!({"id": 3, "email": "a@b.co"}));
        assert_eq!(user.id, "3");
        assert!(!user.is_participant());
        assert!(user.user_journey.is_empty());

        let user = participant(json!({"id": 4, "role": null}));
        assert!(!user.is_participant());
        assert!(participant(json!({"id": 5, "role": "USER"})).is_participant());
    }

    #[test]
    fn explicit_mode_is_upper_cased() {
        let user = participant(json!({"id": 1, "email": "x@y.fr", "participationMode": "online"}));
        assert_eq!(user.participation_label(), "ONLINE");
        assert_eq!(user.attendance(), Attendance::Online);
    }

    #[test]
    fn journey_decides_mode_when_none_is_set() {
        let online = participant(json!({
            "id": 1,
            "userJourney": [{"type": "onsite", "timestamp": "2025-01-01T00:00:00Z"},
                            {"type": "online", "timestamp": "2025-01-02T00:00:00Z"}]
        }));
        assert_eq!(online.participation_label(), "EN LIGNE");

        let onsite = participant(json!({"id": 2, "userJourney": [{"type": "onsite"}]}));
        assert_eq!(onsite.participation_label(), "EN PRÉSENTIEL");

        let mixed = participant(json!({"id": 3}));
        assert_eq!(mixed.participation_label(), "MIXTE");
    }

    #[test]
    fn row_upper_cases_identity_and_lower_cases_email() {
        let user = participant(json!({
            "id": 9,
            "email": "Jean.Dupont@Example.COM",
            "title": "Dr",
            "firstName": "Jean",
            "lastName": "Dupont",
            "country": "Sénégal",
            "videoWatches": [{}, {}],
            "userJourney": [
                {"type": "online", "timestamp": "2025-03-01T08:00:00Z"},
                {"type": "online", "timestamp": "2025-03-04T10:30:00Z"}
            ]
        }));
        let row = user.participant_row();
        assert_eq!(row.title, "DR");
        assert_eq!(row.name, "JEAN DUPONT");
        assert_eq!(row.email, "jean.dupont@example.com");
        assert_eq!(row.country, "SÉNÉGAL");
        assert_eq!(row.videos_seen, 2);
        assert_eq!(row.last_activity, "04/03/2025 10:30:00");
    }
}
