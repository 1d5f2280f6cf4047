//! Third-party integration settings, persisted as (provider, key) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Linkedin,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Linkedin => "linkedin",
        }
    }
}

/// Well-known setting keys.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USERNAME: &str = "username";
    pub const PROFILE_ID: &str = "profile_id";
    pub const CONNECTED_AT: &str = "connected_at";
    pub const LAST_SYNCED_AT: &str = "last_synced_at";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// One persisted setting row. `is_secret` values never leave the server.
pub struct IntegrationSetting {
    pub provider: String,
    pub key: String,
    pub value: String,
    pub is_secret: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Connects GitHub: the token is validated against the GitHub API before
/// anything is persisted.
pub struct GithubConnectRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LinkedinConnectRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1))]
    pub profile_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Connection state returned to the admin UI. Secret values are replaced by
/// a presence flag; live account data is merged in when credentials work.
pub struct IntegrationStatus {
    pub provider: Provider,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Non-secret settings (e.g. username, profile id).
    #[schema(value_type = Object)]
    pub settings: Value,
    /// Live data from the provider, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub account: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Provider::Github).unwrap(), json!("github"));
        assert_eq!(
            serde_json::to_value(Provider::Linkedin).unwrap(),
            json!("linkedin")
        );
    }

    #[test]
    fn connect_requests_reject_empty_values() {
        let bad = GithubConnectRequest { token: "".into() };
        assert!(bad.validate().is_err());

        let bad = LinkedinConnectRequest {
            token: "t".into(),
            profile_id: "".into(),
        };
        assert!(bad.validate().is_err());
    }
}
