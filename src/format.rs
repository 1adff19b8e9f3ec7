use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

/// French month names, January first
pub const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Parses the timestamps the backend sends
///
/// Accepts RFC 3339 (`2025-03-05T10:00:00.000Z`), naive date-times read as
/// UTC, and bare `YYYY-MM-DD` dates read as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `dd/mm/yyyy hh:mm:ss`, or `-` when the value cannot be read
pub fn french_datetime(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(date) => date.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// `dd/mm/yyyy`, or `-` when the value cannot be read
pub fn french_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => "-".to_string(),
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `5 mars 2025`
pub fn long_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_name(date.month()), date.year())
}

/// `mars 2025`
pub fn month_year(date: NaiveDate) -> String {
    format!("{} {}", month_name(date.month()), date.year())
}

/// Generation stamp printed on exported documents: `19 octobre 2026 à 14:05`
pub fn generated_at(now: DateTime<Utc>) -> String {
    format!(
        "{} à {:02}:{:02}",
        long_date(now.date_naive()),
        now.hour(),
        now.minute()
    )
}

/// `2m 5s` from a number of seconds, `N/A` when unknown
pub fn minutes_seconds(seconds: Option<f64>) -> String {
    match seconds {
        Some(value) => {
            let total = value.max(0.0).floor() as i64;
            format!("{}m {}s", total / 60, total % 60)
        }
        None => "N/A".to_string(),
    }
}

/// Prints whole numbers without a fractional part
pub fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Cuts `text` to `max` characters, appending `...` when something was cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
