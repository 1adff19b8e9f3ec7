use std::cmp::Ordering;

use serde_json::Value;

use super::{normalize_list, paging_query, typed};
use crate::backend::{BackendClient, BackendError};
use crate::models::{FormattedPageVisit, PageVisit, format_page_visits};
use crate::table::{Page, SortableRow, compare_id, compare_opt_f64, compare_text};

pub const FALLBACK_MESSAGE: &str = "Erreur lors de la récupération des visites de pages";

fn visit_url(visit: &Value) -> &str {
    visit
        .get("pageUrl")
        .and_then(Value::as_str)
        .or_else(|| visit.get("url").and_then(Value::as_str))
        .unwrap_or("")
}

/// Drops visits of the home page (`/` or no URL) and lowers the total by
/// the number dropped
pub fn filter_home_page(page: &mut Page<Value>) {
    let before = page.data.len();
    page.data.retain(|visit| {
        let url = visit_url(visit);
        url != "/" && !url.is_empty()
    });
    let dropped = (before - page.data.len()) as u64;
    page.pagination.total = page.pagination.total.saturating_sub(dropped);
}

/// One page of visits, as returned by `GET /api/page-visits`
pub async fn fetch(
    backend: &BackendClient,
    token: &str,
    skip: Option<u64>,
    take: Option<u64>,
) -> Result<Page<Value>, BackendError> {
    let response = backend
        .get(Some(token), "/page-visits/all-with-users", &paging_query(skip, take))
        .await?;

    let mut page = normalize_list(response.body, "pageVisits", response.total_count, skip, take)?;
    filter_home_page(&mut page);
    Ok(page)
}

/// One page of visits ready for display
pub async fn fetch_formatted(
    backend: &BackendClient,
    token: &str,
    skip: Option<u64>,
    take: Option<u64>,
) -> Result<Page<FormattedPageVisit>, BackendError> {
    let page = fetch(backend, token, skip, take).await?;
    let visits: Vec<PageVisit> = typed(page.data)?;

    Ok(Page {
        data: format_page_visits(&visits),
        pagination: page.pagination,
    })
}

/// Every visit, used by charts and exports
pub async fn fetch_all(backend: &BackendClient, token: &str) -> Result<Vec<FormattedPageVisit>, BackendError> {
    Ok(fetch_formatted(backend, token, None, None).await?.data)
}

impl SortableRow for FormattedPageVisit {
    fn compare(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "id" => compare_id(&self.id, &other.id),
            "userName" => compare_text(&self.user_name, &other.user_name),
            "userEmail" => compare_text(&self.user_email, &other.user_email),
            "pageUrl" => compare_text(&self.page_url, &other.page_url),
            "timeSpent" => compare_opt_f64(self.time_spent, other.time_spent),
            // dates compare on the ISO value, not the French display text
            _ => self.created_at.cmp(&other.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{PageInfo, SortingState, sort_rows};
    use serde_json::json;

    #[test]
    fn home_page_visits_are_removed_from_data_and_total() {
        let mut page = Page {
            data: vec![
                json!({"id": 1, "pageUrl": "/"}),
                json!({"id": 2, "pageUrl": "/programme"}),
                json!({"id": 3, "url": ""}),
                json!({"id": 4, "url": "/videos"}),
            ],
            pagination: PageInfo { total: 40, skip: 0, take: 4, has_more: true },
        };
        filter_home_page(&mut page);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total, 38);
    }

    #[test]
    fn sorts_on_iso_dates() {
        let visits: Vec<PageVisit> = serde_json::from_value(json!([
            {"id": 1, "pageUrl": "/a", "createdAt": "2025-01-02T10:00:00Z"},
            {"id": 2, "pageUrl": "/b", "createdAt": "2024-12-31T10:00:00Z"},
            {"id": 3, "pageUrl": "/c", "createdAt": "2025-01-10T10:00:00Z"}
        ]))
        .unwrap();
        let mut rows = format_page_visits(&visits);
        sort_rows(&mut rows, &SortingState::desc("dateVisited"));
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }
}
