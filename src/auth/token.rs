use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::models::{de_id, de_null_default, de_opt_number};

/// Claims carried by the backend's access token
///
/// The signature is never checked here: the backend issued the token and
/// validates it on every proxied call. These claims only drive navigation
/// and page gating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Claims {
    #[serde(deserialize_with = "de_id")]
    pub sub: String,
    #[serde(deserialize_with = "de_null_default")]
    pub email: String,
    #[serde(deserialize_with = "de_null_default")]
    pub role: Role,
    #[serde(deserialize_with = "de_opt_number")]
    pub exp: Option<f64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Claims {
    /// Tokens without `exp` never expire on our side
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now as f64)
    }

    /// `Prénom Nom` when the token carries names, else the email
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Decodes the payload segment of a JWT
///
/// # Arguments
/// * `token` - The compact `header.payload.signature` token
///
/// # Returns
/// * `Option<Claims>` - The claims, or `None` when the token is malformed
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.trim().split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
pub(crate) fn encode_for_tests(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_payload_claims() {
        let token = encode_for_tests(&json!({
            "sub": 42, "email": "admin@forum.sn", "role": "ADMIN", "exp": 2_000_000_000
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Admin);
        assert!(!claims.is_expired(1_700_000_000));
        assert!(claims.is_expired(2_000_000_000));
        assert_eq!(claims.display_name(), "admin@forum.sn");
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(decode_claims(""), None);
        assert_eq!(decode_claims("abc"), None);
        assert_eq!(decode_claims("a.b.c.d"), None);
        assert_eq!(decode_claims("a.%%%.c"), None);
        let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("hello"));
        assert_eq!(decode_claims(&not_json), None);
    }

    #[test]
    fn token_without_expiry_stays_valid() {
        let token = encode_for_tests(&json!({"sub": "u1", "email": "m@f.sn", "role": "MANAGER",
            "firstName": "Marie", "lastName": "Faye"}));
        let claims = decode_claims(&token).unwrap();
        assert!(!claims.is_expired(i64::MAX / 2));
        assert_eq!(claims.display_name(), "Marie Faye");
    }
}
