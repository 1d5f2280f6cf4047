//! Session lifecycle: issuance, validation, CSRF binding, destruction.
//!
//! Sessions are server-held records keyed by an opaque token; the CSRF token
//! is minted alongside the session and verified against the stored record,
//! so CSRF validity is inseparable from session validity. Expired records
//! are detected and deleted on access, not swept in the background.

use std::time::Duration;

use axum::http::HeaderMap;
use chrono::Utc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::session::SessionRecord;
use crate::models::user::{User, ADMIN_ROLE};
use crate::repositories::{session as session_repo, user as user_repo};
use crate::services::cache::Cache;
use crate::state::AppState;
use crate::utils::cookies::{
    build_clear_cookie, build_cookie, extract_cookie_value, resolve_secure, CookieOptions,
    COOKIE_PATH,
};
use crate::utils::token::generate_token;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Typed auth outcome used inside the service; converted to an HTTP error at
/// the handler boundary.
#[derive(Debug)]
pub enum AuthError {
    Unauthorized(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthError::BadRequest(msg) => AppError::BadRequest(msg),
            AuthError::Internal(err) => AppError::InternalServerError(err),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Internal(err.into())
    }
}

/// A validated session together with its resolved owner.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
    pub csrf_token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct SessionService {
    pool: DbPool,
    cache: Cache,
    config: Config,
}

fn session_cache_key(token: &str) -> String {
    format!("session:{}", token)
}

impl SessionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            cache: state.cache.clone(),
            config: state.config.clone(),
        }
    }

    pub fn from_parts(pool: DbPool, cache: Cache, config: Config) -> Self {
        Self {
            pool,
            cache,
            config,
        }
    }

    /// Issues a new session for a verified user: two independent opaque
    /// tokens, a record expiring after the configured max age, and a cache
    /// entry keyed by the session token.
    pub async fn create_session(&self, user: &User) -> Result<SessionRecord, AuthError> {
        let now = Utc::now();
        let record = SessionRecord {
            token: generate_token(),
            user_id: user.id.clone(),
            role: if user.is_admin() {
                ADMIN_ROLE.to_string()
            } else {
                "user".to_string()
            },
            csrf_token: generate_token(),
            expires_at: now + chrono::Duration::seconds(self.config.session_max_age_seconds as i64),
            created_at: now,
        };
        session_repo::insert_session(&self.pool, &record).await?;
        self.cache
            .put_json(&session_cache_key(&record.token), &record)
            .await;
        Ok(record)
    }

    /// Resolves the session referenced by the request's cookie header.
    ///
    /// Returns `Ok(None)` when no session cookie is present, when the record
    /// is expired (deleting it on the way out), or when the owning user no
    /// longer exists (orphaned sessions are deleted too).
    pub async fn get_session(
        &self,
        cookie_header: Option<&str>,
    ) -> Result<Option<SessionContext>, AuthError> {
        let Some(token) = self.session_token_from(cookie_header) else {
            return Ok(None);
        };

        let key = session_cache_key(&token);
        let record = match self.cache.get_json::<SessionRecord>(&key).await {
            Some(record) => Some(record),
            None => {
                let record = session_repo::find_session_by_token(&self.pool, &token).await?;
                if let Some(record) = &record {
                    self.cache.put_json(&key, record).await;
                }
                record
            }
        };
        let Some(record) = record else {
            return Ok(None);
        };

        if record.is_expired(Utc::now()) {
            tracing::debug!(user_id = %record.user_id, "Session expired, deleting record");
            self.delete_record(&token).await?;
            return Ok(None);
        }

        let user = user_repo::read_user(&self.pool, &self.cache, &record.user_id).await?;
        let Some(user) = user else {
            tracing::warn!(user_id = %record.user_id, "Session owner gone, deleting orphaned session");
            self.delete_record(&token).await?;
            return Ok(None);
        };

        Ok(Some(SessionContext {
            token: record.token,
            csrf_token: record.csrf_token,
            user,
        }))
    }

    /// `get_session` plus a privileged-role check.
    pub async fn require_admin_session(
        &self,
        cookie_header: Option<&str>,
    ) -> Result<SessionContext, AuthError> {
        let session = self
            .get_session(cookie_header)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Authentication required".to_string()))?;
        if !session.user.is_admin() {
            return Err(AuthError::Unauthorized(
                "Administrator session required".to_string(),
            ));
        }
        Ok(session)
    }

    /// Requires a valid admin session whose stored CSRF token exactly equals
    /// the single `x-csrf-token` request header.
    pub async fn assert_csrf(
        &self,
        cookie_header: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<SessionContext, AuthError> {
        let session = self.require_admin_session(cookie_header).await?;

        let mut values = headers.get_all(CSRF_HEADER).iter();
        let first = values
            .next()
            .ok_or_else(|| AuthError::BadRequest("Missing CSRF token header".to_string()))?;
        if values.next().is_some() {
            return Err(AuthError::BadRequest(
                "Multiple CSRF token headers".to_string(),
            ));
        }
        let provided = first
            .to_str()
            .map_err(|_| AuthError::BadRequest("Malformed CSRF token header".to_string()))?;
        if provided != session.csrf_token {
            return Err(AuthError::BadRequest("CSRF token mismatch".to_string()));
        }
        Ok(session)
    }

    /// Deletes the session referenced by the cookie header, if any.
    /// Idempotent: absent cookie or already-deleted record are fine.
    pub async fn destroy_session(&self, cookie_header: Option<&str>) -> Result<(), AuthError> {
        if let Some(token) = self.session_token_from(cookie_header) {
            self.delete_record(&token).await?;
        }
        Ok(())
    }

    async fn delete_record(&self, token: &str) -> Result<(), AuthError> {
        session_repo::delete_session_by_token(&self.pool, token).await?;
        self.cache.invalidate(&[&session_cache_key(token)]).await;
        Ok(())
    }

    fn session_token_from(&self, cookie_header: Option<&str>) -> Option<String> {
        cookie_header
            .and_then(|raw| extract_cookie_value(raw, &self.config.session_cookie_name))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// Decides the Secure attribute for this request (config override wins).
    pub fn secure_for(&self, headers: &HeaderMap) -> bool {
        self.config
            .cookie_secure
            .unwrap_or_else(|| resolve_secure(Some(headers), None))
    }

    /// Cookies set alongside a fresh session: session token (HttpOnly),
    /// CSRF token (script-readable so it can be echoed in a header), and
    /// the presence flag.
    pub fn issue_cookies(&self, record: &SessionRecord, secure: bool) -> Vec<String> {
        let max_age = Duration::from_secs(self.config.session_max_age_seconds);
        let same_site = self.config.cookie_same_site;
        let hidden = CookieOptions {
            secure,
            same_site,
            http_only: true,
        };
        let readable = CookieOptions {
            secure,
            same_site,
            http_only: false,
        };
        vec![
            build_cookie(
                &self.config.session_cookie_name,
                &record.token,
                max_age,
                COOKIE_PATH,
                hidden,
            ),
            build_cookie(
                &self.config.csrf_cookie_name,
                &record.csrf_token,
                max_age,
                COOKIE_PATH,
                readable,
            ),
            build_cookie(
                &self.config.presence_cookie_name,
                "1",
                max_age,
                COOKIE_PATH,
                hidden,
            ),
        ]
    }

    /// Clearing counterparts for every auth cookie, including the
    /// script-readable user cookie the client keeps.
    pub fn clearing_cookies(&self, secure: bool) -> Vec<String> {
        let same_site = self.config.cookie_same_site;
        let hidden = CookieOptions {
            secure,
            same_site,
            http_only: true,
        };
        let readable = CookieOptions {
            secure,
            same_site,
            http_only: false,
        };
        vec![
            build_clear_cookie(&self.config.session_cookie_name, COOKIE_PATH, hidden),
            build_clear_cookie(&self.config.csrf_cookie_name, COOKIE_PATH, readable),
            build_clear_cookie(&self.config.presence_cookie_name, COOKIE_PATH, hidden),
            build_clear_cookie(&self.config.user_cookie_name, COOKIE_PATH, readable),
        ]
    }
}
