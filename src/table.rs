use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub const MIN_PAGE_SIZE: u64 = 5;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Zero-based page position of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: u64,
    pub page_size: u64,
}

impl PaginationState {
    pub fn new(page_index: u64, page_size: u64) -> Self {
        Self {
            page_index,
            page_size: page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }

    /// Reads the 1-based `page` and `size` URL parameters
    ///
    /// Missing or unparsable values fall back to the first page and
    /// `default_size`.
    pub fn from_query(page: Option<&str>, size: Option<&str>, default_size: u64) -> Self {
        let page = page
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);
        let size = size
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(default_size);
        Self::new(page - 1, size)
    }

    /// Row offset of the page, saturating for absurd page numbers
    pub fn skip(&self) -> u64 {
        self.page_index.saturating_mul(self.page_size)
    }

    pub fn take(&self) -> u64 {
        self.page_size
    }

    /// 1-based page number for links
    pub fn page_number(&self) -> u64 {
        self.page_index.saturating_add(1)
    }

    /// Rows of the current page taken from an already filtered list
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = (self.skip() as usize).min(rows.len());
        let end = start.saturating_add(self.take() as usize).min(rows.len());
        &rows[start..end]
    }
}

/// Pagination block returned with list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub skip: u64,
    pub take: u64,
    pub has_more: bool,
}

impl PageInfo {
    pub fn new(total: u64, skip: u64, take: u64, returned: u64) -> Self {
        Self {
            total,
            skip,
            take,
            has_more: skip.saturating_add(returned) < total,
        }
    }

    /// Number of pages needed for `total` rows, at least one
    pub fn page_count(&self) -> u64 {
        if self.take == 0 {
            return 1;
        }
        self.total.div_ceil(self.take).max(1)
    }
}

/// One page of rows and where it sits in the full set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Column sort requested with `sort=<col>` or `sort=-<col>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortingState {
    pub id: String,
    pub desc: bool,
}

impl SortingState {
    pub fn parse(raw: Option<&str>, default: SortingState) -> Self {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => match raw.strip_prefix('-') {
                Some(id) => SortingState { id: id.to_string(), desc: true },
                None => SortingState { id: raw.to_string(), desc: false },
            },
            None => default,
        }
    }

    pub fn desc(id: &str) -> Self {
        SortingState { id: id.to_string(), desc: true }
    }

    /// Value of the `sort` parameter that reverses this column, or sorts
    /// another column ascending
    pub fn toggle_for(&self, column: &str) -> String {
        if self.id == column && !self.desc {
            format!("-{column}")
        } else {
            column.to_string()
        }
    }

    pub fn to_param(&self) -> String {
        if self.desc {
            format!("-{}", self.id)
        } else {
            self.id.clone()
        }
    }
}

/// Sortable rows expose one comparator per column
pub trait SortableRow {
    fn compare(&self, other: &Self, column: &str) -> Ordering;
}

/// Stable sort of `rows` by the requested column
pub fn sort_rows<T: SortableRow>(rows: &mut [T], sorting: &SortingState) {
    rows.sort_by(|a, b| {
        let ordering = a.compare(b, &sorting.id);
        if sorting.desc { ordering.reverse() } else { ordering }
    });
}

/// Compares numbers where `None` sorts first
pub fn compare_opt_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares text ignoring case
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Compares ids numerically when both are numbers
pub fn compare_id(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_to_offset() {
        let state = PaginationState::new(2, 20);
        assert_eq!(state.skip(), 40);
        assert_eq!(state.take(), 20);
        assert_eq!(state.page_number(), 3);
    }

    #[test]
    fn query_is_one_based_and_clamped() {
        let state = PaginationState::from_query(Some("3"), Some("1000"), 20);
        assert_eq!(state.page_index, 2);
        assert_eq!(state.page_size, MAX_PAGE_SIZE);

        let state = PaginationState::from_query(Some("0"), Some("abc"), 20);
        assert_eq!(state.page_index, 0);
        assert_eq!(state.page_size, 20);

        assert_eq!(PaginationState::from_query(None, Some("1"), 10).page_size, MIN_PAGE_SIZE);
    }

    #[test]
    fn slice_returns_the_requested_window() {
        let rows: Vec<u32> = (1..=23).collect();
        assert_eq!(PaginationState::new(0, 10).slice(&rows), &rows[0..10]);
        assert_eq!(PaginationState::new(2, 10).slice(&rows), &[21, 22, 23]);
        assert!(PaginationState::new(5, 10).slice(&rows).is_empty());
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let state = PaginationState::from_query(Some("18446744073709551615"), Some("20"), 20);
        assert_eq!(state.skip(), u64::MAX);
        assert_eq!(state.page_number(), u64::MAX);
        assert!(state.slice(&[1, 2, 3]).is_empty());

        let info = PageInfo::new(45, state.skip(), state.take(), 0);
        assert!(!info.has_more);
        assert!(!PageInfo::new(u64::MAX, u64::MAX, 20, 20).has_more);
    }

    #[test]
    fn has_more_and_page_count() {
        let info = PageInfo::new(45, 40, 20, 5);
        assert!(!info.has_more);
        assert_eq!(info.page_count(), 3);
        assert!(PageInfo::new(45, 0, 20, 20).has_more);
        assert_eq!(PageInfo::new(0, 0, 20, 0).page_count(), 1);
    }

    #[test]
    fn sort_parameter() {
        let default = SortingState::desc("createdAt");
        assert_eq!(SortingState::parse(None, default.clone()), default);
        assert_eq!(
            SortingState::parse(Some("-userName"), default.clone()),
            SortingState { id: "userName".into(), desc: true }
        );
        let by_url = SortingState::parse(Some("pageUrl"), default);
        assert!(!by_url.desc);
        assert_eq!(by_url.toggle_for("pageUrl"), "-pageUrl");
        assert_eq!(by_url.toggle_for("userName"), "userName");
    }
}
