//! Models that represent users and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::UserId;

/// Privileged role required for the admin surface.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of an account.
pub struct User {
    /// Unique identifier for the user.
    pub id: String,
    /// Immutable username used for login.
    pub username: String,
    /// Email address, also accepted as a login identifier.
    pub email: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// URL (or data URI) of the profile photo.
    pub photo: Option<String>,
    /// Role names held by the account.
    pub roles: Vec<String>,
    /// Disabled accounts cannot authenticate.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new user with a freshly generated identifier.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        roles: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new().to_string(),
            username,
            email,
            password_hash,
            first_name: None,
            last_name: None,
            photo: None,
            roles,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when the account is enabled and holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.enabled && self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub roles: Vec<String>,
    pub enabled: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            photo: user.photo,
            roles: user.roles,
            enabled: user.enabled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
///
/// Sent form-encoded. The identifier matches either username or email;
/// `email` and `username` are accepted as historical field names.
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Session token and user returned after a successful login.
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Answer for the session probe endpoint.
pub struct SessionEnvelope {
    pub authenticated: bool,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Short-lived credential for the realtime notification hub.
pub struct RealtimeTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
