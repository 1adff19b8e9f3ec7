use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::format::{long_date, month_year, parse_timestamp};
use crate::models::User;

/// Inclusive activity date range picked in the participants filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

impl DateRange {
    /// Reads `YYYY-MM-DD` values; anything else leaves that bound unset
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: parse_day(from),
            to: parse_day(to),
        }
    }

    /// The filter only applies once both bounds are set
    pub fn is_active(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Start of `from` and the last millisecond of `to`, in UTC
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.from?.and_hms_milli_opt(0, 0, 0, 0)?.and_utc();
        let end = self.to?.and_hms_milli_opt(23, 59, 59, 999)?.and_utc();
        Some((start, end))
    }

    pub fn contains(&self, moment: DateTime<Utc>) -> bool {
        match self.bounds() {
            Some((start, end)) => moment >= start && moment <= end,
            None => true,
        }
    }

    /// True when one of the participant's journey steps falls in the range
    ///
    /// Participants without any journey are left out while a range is
    /// active.
    pub fn matches(&self, user: &User) -> bool {
        if !self.is_active() {
            return true;
        }
        user.user_journey.iter().any(|entry| {
            entry
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .is_some_and(|moment| self.contains(moment))
        })
    }

    pub fn current_month(today: NaiveDate) -> Self {
        let from = first_of_month(today.year(), today.month());
        let to = from
            .and_then(|first| first.checked_add_months(chrono::Months::new(1)))
            .map(|next| next - Duration::days(1));
        Self { from, to }
    }

    pub fn last_month(today: NaiveDate) -> Self {
        let this_month = first_of_month(today.year(), today.month());
        let from = this_month.and_then(|first| first.checked_sub_months(chrono::Months::new(1)));
        let to = this_month.map(|first| first - Duration::days(1));
        Self { from, to }
    }

    /// Human description printed on the participants PDF
    ///
    /// `Mois de mars 2025` for the current or last calendar month, else
    /// `Du 3 mars 2025 au 9 mars 2025`. `None` while the filter is inactive.
    pub fn period_text(&self, today: NaiveDate) -> Option<String> {
        let (from, to) = (self.from?, self.to?);
        if *self == Self::current_month(today) || *self == Self::last_month(today) {
            return Some(format!("Mois de {}", month_year(from)));
        }
        Some(format!("Du {} au {}", long_date(from), long_date(to)))
    }

    /// Query string fragment carrying the range over links and exports
    pub fn to_query(&self) -> String {
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!("dateFrom={from}&dateTo={to}"),
            _ => String::new(),
        }
    }
}

/// Participants kept by the range, in their original order
pub fn filter_participants<'a>(users: &'a [User], range: &DateRange) -> Vec<&'a User> {
    users.iter().filter(|user| range.matches(user)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn with_journey(timestamps: &[&str]) -> User {
        let journey: Vec<_> = timestamps
            .iter()
            .map(|ts| json!({"type": "online", "timestamp": ts}))
            .collect();
        serde_json::from_value(json!({"id": 1, "userJourney": journey})).unwrap()
    }

    #[test]
    fn half_open_range_is_inactive() {
        let range = DateRange::parse(Some("2025-03-01"), None);
        assert!(!range.is_active());
        assert!(range.matches(&with_journey(&[])));
    }

    #[test]
    fn end_day_is_inclusive() {
        let range = DateRange::parse(Some("2025-03-01"), Some("2025-03-31"));
        assert!(range.matches(&with_journey(&["2025-03-31T23:59:59.500Z"])));
        assert!(!range.matches(&with_journey(&["2025-04-01T00:00:00Z"])));
        assert!(!range.matches(&with_journey(&["2025-02-28T23:59:59Z"])));
    }

    #[test]
    fn participants_without_journey_are_excluded() {
        let range = DateRange::parse(Some("2025-03-01"), Some("2025-03-31"));
        let users = vec![
            with_journey(&[]),
            with_journey(&["2025-03-10T10:00:00Z"]),
            with_journey(&["2025-01-10T10:00:00Z", "2025-03-02T10:00:00Z"]),
        ];
        assert_eq!(filter_participants(&users, &range).len(), 2);
    }

    #[test]
    fn quick_ranges() {
        let today = day("2025-03-15");
        assert_eq!(
            DateRange::current_month(today),
            DateRange { from: Some(day("2025-03-01")), to: Some(day("2025-03-31")) }
        );
        assert_eq!(
            DateRange::last_month(day("2025-01-20")),
            DateRange { from: Some(day("2024-12-01")), to: Some(day("2024-12-31")) }
        );
    }

    #[test]
    fn period_descriptions() {
        let today = day("2025-03-15");
        assert_eq!(
            DateRange::current_month(today).period_text(today).as_deref(),
            Some("Mois de mars 2025")
        );
        assert_eq!(
            DateRange::last_month(today).period_text(today).as_deref(),
            Some("Mois de février 2025")
        );
        let custom = DateRange::parse(Some("2025-03-03"), Some("2025-03-09"));
        assert_eq!(
            custom.period_text(today).as_deref(),
            Some("Du 3 mars 2025 au 9 mars 2025")
        );
        assert_eq!(DateRange::default().period_text(today), None);
    }
}
