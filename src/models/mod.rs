//! JSON shapes consumed from the backend
//!
//! The backend is loose about types (ids come as numbers or strings, optional
//! fields come as `null` or are missing), so every model defaults its fields
//! and goes through the tolerant deserializers below.

pub mod dashboard;
pub mod page_visit;
pub mod user;
pub mod video_watch;

pub use dashboard::*;
pub use page_visit::*;
pub use user::*;
pub use video_watch::*;

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Reads an id sent as a number or a string
pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// Treats `null` like a missing field
pub fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Reads text that is sometimes sent as a number
pub fn de_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        _ => Ok(None),
    }
}

/// Reads a number that is sometimes sent as a string
pub fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_number(deserializer)?.unwrap_or_default())
}

pub fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(text) => Ok(text.trim().parse().ok()),
        _ => Ok(None),
    }
}
