//! Server-held session records keyed by opaque token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// One authenticated session. Lifecycle: created on login, read on every
/// request bearing the session cookie, deleted on logout or on first access
/// after `expires_at` (lazy expiry, no background sweep).
pub struct SessionRecord {
    /// Opaque unique token, primary key. Never exposed to script.
    pub token: String,
    /// Owning account identifier.
    pub user_id: String,
    /// Privilege level captured at issuance.
    pub role: String,
    /// Must accompany every mutating request bound to this session.
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
