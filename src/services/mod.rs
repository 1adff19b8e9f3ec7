//! Typed calls to the backend, shared by the `/api` routes and the pages
//!
//! The backend has shipped several list shapes over time; everything is
//! normalised here to a [`Page`] so callers only ever see one.

pub mod auth;
pub mod dashboard;
pub mod page_visits;
pub mod users;
pub mod video_watches;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;
use crate::table::{Page, PageInfo};

fn read_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Brings any known list shape to `{data, pagination}`
///
/// # Arguments
/// * `body` - Parsed backend body
/// * `legacy_key` - Collection key of the older `{<key>, pagination}` shape
/// * `total_header` - `X-Total-Count`, used with plain arrays
/// * `skip`, `take` - What was requested
///
/// # Returns
/// * `Result<Page<Value>, BackendError>` - The page, or `InvalidBody` for an
///   unknown shape
pub fn normalize_list(
    body: Value,
    legacy_key: &str,
    total_header: Option<u64>,
    skip: Option<u64>,
    take: Option<u64>,
) -> Result<Page<Value>, BackendError> {
    let skip_or_zero = skip.unwrap_or(0);

    match body {
        Value::Array(items) => {
            let len = items.len() as u64;
            let total = total_header.unwrap_or(len);
            let take = take.unwrap_or(len);
            Ok(Page {
                pagination: PageInfo::new(total, skip_or_zero, take, len),
                data: items,
            })
        }
        Value::Object(mut object) => {
            let pagination = object.remove("pagination").unwrap_or(Value::Null);
            let items = match object.remove("data") {
                Some(Value::Array(items)) => Some((items, false)),
                _ => match object.remove(legacy_key) {
                    Some(Value::Array(items)) => Some((items, true)),
                    _ => None,
                },
            };
            let Some((items, legacy)) = items else {
                return Err(BackendError::InvalidBody(format!(
                    "expected `data` or `{legacy_key}` list"
                )));
            };

            let len = items.len() as u64;
            let total = if legacy {
                read_u64(pagination.get("totalCount")).or_else(|| read_u64(pagination.get("total")))
            } else {
                read_u64(pagination.get("total")).or_else(|| read_u64(pagination.get("totalCount")))
            }
            .unwrap_or(len);
            let skip = if legacy {
                skip_or_zero
            } else {
                read_u64(pagination.get("skip")).unwrap_or(skip_or_zero)
            };
            let take = if legacy {
                take.unwrap_or(len)
            } else {
                read_u64(pagination.get("take")).or(take).unwrap_or(len)
            };
            let has_more = match pagination.get("hasMore").and_then(Value::as_bool) {
                Some(flag) => flag,
                None if legacy => false,
                None => skip.saturating_add(len) < total,
            };

            Ok(Page {
                data: items,
                pagination: PageInfo { total, skip, take, has_more },
            })
        }
        _ => Err(BackendError::InvalidBody("expected a list".to_string())),
    }
}

/// Reads a plain list that may also come wrapped in `users` or `data`
pub fn list_items(body: Value) -> Result<Vec<Value>, BackendError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object
            .remove("users")
            .or_else(|| object.remove("data"))
        {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(BackendError::InvalidBody("expected a list".to_string())),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(BackendError::InvalidBody("expected a list".to_string())),
    }
}

/// Deserializes records, reporting the first one that does not fit
pub fn typed<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, BackendError> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| BackendError::InvalidBody(e.to_string())))
        .collect()
}

/// Query pairs for `skip`/`take` when they were given
pub fn paging_query(skip: Option<u64>, take: Option<u64>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(skip) = skip {
        query.push(("skip", skip.to_string()));
    }
    if let Some(take) = take {
        query.push(("take", take.to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_shape_keeps_backend_pagination() {
        let body = json!({
            "data": [{"id": 1}, {"id": 2}],
            "pagination": {"total": 12, "skip": 10, "take": 2, "hasMore": false}
        });
        let page = normalize_list(body, "pageVisits", None, Some(10), Some(2)).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination, PageInfo { total: 12, skip: 10, take: 2, has_more: false });
    }

    #[test]
    fn legacy_shape_uses_total_count() {
        let body = json!({"pageVisits": [{"id": 1}], "pagination": {"totalCount": 30}});
        let page = normalize_list(body, "pageVisits", None, Some(20), Some(10)).unwrap();
        assert_eq!(page.pagination, PageInfo { total: 30, skip: 20, take: 10, has_more: false });
    }

    #[test]
    fn plain_array_uses_header_total() {
        let body = json!([{"id": 1}, {"id": 2}]);
        let page = normalize_list(body, "videoWatches", Some(7), Some(0), Some(2)).unwrap();
        assert_eq!(page.pagination, PageInfo { total: 7, skip: 0, take: 2, has_more: true });

        let page = normalize_list(json!([]), "videoWatches", None, None, None).unwrap();
        assert_eq!(page.pagination, PageInfo { total: 0, skip: 0, take: 0, has_more: false });
    }

    #[test]
    fn unknown_shapes_are_invalid() {
        assert!(normalize_list(json!({"items": []}), "pageVisits", None, None, None).is_err());
        assert!(normalize_list(json!("oops"), "pageVisits", None, None, None).is_err());
    }

    #[test]
    fn plain_lists_may_be_wrapped() {
        assert_eq!(list_items(json!({"users": [1, 2]})).unwrap().len(), 2);
        assert_eq!(list_items(json!([1])).unwrap().len(), 1);
        assert!(list_items(json!({"count": 1})).is_err());
    }
}
