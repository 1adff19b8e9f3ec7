use serde::Deserialize;
use serde_json::{Value, json};

use super::{list_items, typed};
use crate::backend::{BackendClient, BackendError, BackendResponse};
use crate::models::User;

/// Query parameters forwarded to `GET /users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
    pub order_by: Option<String>,
    #[serde(rename = "where")]
    pub filter: Option<String>,
    pub cursor: Option<String>,
}

impl UsersQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("skip", &self.skip),
            ("take", &self.take),
            ("orderBy", &self.order_by),
            ("where", &self.filter),
            ("cursor", &self.cursor),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|value| !value.is_empty())
                .map(|value| (key, value.to_string()))
        })
        .collect()
    }

    fn number(value: &Option<String>) -> Option<u64> {
        value.as_deref().and_then(|raw| raw.trim().parse().ok())
    }

    /// `{users, pagination: {totalCount, pageSize, pageIndex}}`
    ///
    /// `pageSize` defaults to 10 and `pageIndex` is `floor(skip / take)`
    /// when both are given, 0 otherwise.
    pub fn wrap(&self, users: Vec<Value>, total_count: Option<u64>) -> Value {
        let take = Self::number(&self.take);
        let skip = Self::number(&self.skip);
        let page_index = match (skip, take) {
            (Some(skip), Some(take)) if take > 0 => skip / take,
            _ => 0,
        };

        json!({
            "pagination": {
                "totalCount": total_count.unwrap_or(users.len() as u64),
                "pageSize": take.unwrap_or(10),
                "pageIndex": page_index,
            },
            "users": users,
        })
    }
}

pub async fn list(
    backend: &BackendClient,
    token: &str,
    query: &UsersQuery,
) -> Result<(Vec<Value>, Option<u64>), BackendError> {
    let response = backend.get(Some(token), "/users", &query.pairs()).await?;
    Ok((list_items(response.body)?, response.total_count))
}

/// Every account with role `USER`
pub async fn participants(backend: &BackendClient, token: &str) -> Result<Vec<User>, BackendError> {
    let (items, _) = list(backend, token, &UsersQuery::default()).await?;
    let users: Vec<User> = typed(items)?;
    Ok(users.into_iter().filter(User::is_participant).collect())
}

/// Raw `/users/admins` answer
pub async fn admins_raw(backend: &BackendClient, token: &str) -> Result<BackendResponse, BackendError> {
    backend.get(Some(token), "/users/admins", &[]).await
}

/// SPADMIN, ADMIN and MANAGER accounts
pub async fn system_users(backend: &BackendClient, token: &str) -> Result<Vec<User>, BackendError> {
    let response = admins_raw(backend, token).await?;
    let users: Vec<User> = typed(list_items(response.body)?)?;
    Ok(users.into_iter().filter(|user| user.role.is_staff()).collect())
}

fn user_path(id: &str) -> String {
    format!("/users/{}", urlencoding::encode(id))
}

pub async fn get_raw(backend: &BackendClient, token: &str, id: &str) -> Result<Value, BackendError> {
    Ok(backend.get(Some(token), &user_path(id), &[]).await?.body)
}

pub async fn get(backend: &BackendClient, token: &str, id: &str) -> Result<User, BackendError> {
    let body = get_raw(backend, token, id).await?;
    serde_json::from_value(body).map_err(|e| BackendError::InvalidBody(e.to_string()))
}

pub async fn create(backend: &BackendClient, token: &str, payload: &Value) -> Result<Value, BackendError> {
    Ok(backend.post(Some(token), "/users", payload).await?.body)
}

pub async fn replace(backend: &BackendClient, token: &str, id: &str, payload: &Value) -> Result<Value, BackendError> {
    Ok(backend.put(Some(token), &user_path(id), payload).await?.body)
}

pub async fn update(backend: &BackendClient, token: &str, id: &str, payload: &Value) -> Result<Value, BackendError> {
    Ok(backend.patch(Some(token), &user_path(id), payload).await?.body)
}

pub async fn delete(backend: &BackendClient, token: &str, id: &str) -> Result<Value, BackendError> {
    Ok(backend.delete(Some(token), &user_path(id)).await?.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_wrapper() {
        let query = UsersQuery {
            skip: Some("20".into()),
            take: Some("10".into()),
            ..Default::default()
        };
        let wrapped = query.wrap(vec![json!({"id": 1})], Some(57));
        assert_eq!(wrapped["pagination"]["totalCount"], 57);
        assert_eq!(wrapped["pagination"]["pageSize"], 10);
        assert_eq!(wrapped["pagination"]["pageIndex"], 2);
        assert_eq!(wrapped["users"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn wrapper_defaults() {
        let wrapped = UsersQuery::default().wrap(vec![json!({}), json!({})], None);
        assert_eq!(wrapped["pagination"]["totalCount"], 2);
        assert_eq!(wrapped["pagination"]["pageSize"], 10);
        assert_eq!(wrapped["pagination"]["pageIndex"], 0);
    }

    #[test]
    fn only_given_parameters_are_forwarded() {
        let query = UsersQuery {
            take: Some("5".into()),
            filter: Some("{\"role\":\"USER\"}".into()),
            order_by: Some(String::new()),
            ..Default::default()
        };
        let pairs = query.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("take", "5".to_string()));
        assert_eq!(pairs[1].0, "where");
    }
}
