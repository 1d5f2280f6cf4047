//! DTOs and tolerant response-shape handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The user record mirrored into reactive state and the user cookie.
/// `id`, `username` and `email` are mandatory; everything else is optional
/// and may be dropped when the cookie payload runs over budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionEnvelope {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Wrapper keys historical API responses have nested user payloads under.
const WRAPPER_KEYS: &[&str] = &["data", "profile", "user", "result"];

fn looks_like_user(value: &Value) -> bool {
    value.is_object()
        && ["id", "username", "email"]
            .iter()
            .any(|key| value.get(key).map(Value::is_string).unwrap_or(false))
}

/// Finds the first object satisfying the user predicate, searching the value
/// itself and then known wrapper keys depth-first. The depth bound makes
/// pathological nesting terminate instead of recursing forever.
pub fn unwrap_user_payload(value: &Value) -> Option<&Value> {
    fn walk<'a>(value: &'a Value, depth: u8) -> Option<&'a Value> {
        if looks_like_user(value) {
            return Some(value);
        }
        if depth == 0 {
            return None;
        }
        for key in WRAPPER_KEYS {
            if let Some(inner) = value.get(key) {
                if let Some(found) = walk(inner, depth - 1) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(value, 4)
}

/// Parses the user out of a login-shaped response body.
pub fn user_from_payload(value: &Value) -> Option<AuthUser> {
    unwrap_user_payload(value)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

/// Pulls the session token out of a login-shaped response body.
pub fn token_from_payload(value: &Value) -> Option<String> {
    for key in ["token", "session_token", "access_token"] {
        if let Some(token) = value.get(key).and_then(Value::as_str) {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    value
        .get("data")
        .and_then(|inner| token_from_payload(inner))
}
