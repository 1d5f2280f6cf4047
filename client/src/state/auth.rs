//! Auth session orchestrator.
//!
//! Reconciles three sources of truth — in-memory state, the cookie-backed
//! credential store, and the server's session endpoint — into a single
//! `is_authenticated` signal, and drives login, logout, forced logout on
//! 401, and background profile refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::api::{
    login_error_message, token_from_payload, user_from_payload, ApiClient, AuthUser,
};
use crate::state::credentials::{CookieJar, CookieNames, CredentialStore};

/// Locales the routing layer serves; the first path segment decides.
const KNOWN_LOCALES: &[&str] = &["en", "de", "fr", "es"];

const GENERIC_LOGIN_ERROR: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// User record mirrored from the user cookie or a server response.
    pub current_user: Option<AuthUser>,
    /// Mirrors the presence cookie.
    pub token_available: bool,
    /// Mirrors the session cookie.
    pub session_token: Option<String>,
    /// True once initialization has resolved at least once.
    pub ready: bool,
    /// Where to return after login, set when a protected route bounced us.
    pub redirect_target: Option<String>,
    pub realtime_token: Option<String>,
    pub realtime_expires_at: Option<DateTime<Utc>>,
    pub login_error: Option<String>,
    pub session_message: Option<String>,
}

impl AuthState {
    /// Token presence alone is not enough (it could be stale), and a cached
    /// user without a live token is not enough either.
    pub fn is_authenticated(&self) -> bool {
        self.token_available && self.current_user.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogoutOptions {
    /// Message to surface after local state is cleared.
    pub notify: Option<String>,
    /// Whether the caller should navigate to the login route afterwards.
    pub redirect: bool,
    /// Explicit navigation target overriding the locale-aware login path.
    pub redirect_to: Option<String>,
    /// Path the user is currently on; used for locale detection.
    pub current_path: Option<String>,
}

struct Inner {
    api: ApiClient,
    store: Arc<CredentialStore>,
    state: Mutex<AuthState>,
    /// Serializes overlapping `refresh_session` calls so each one observes
    /// the full step sequence instead of racing last-write-wins.
    refresh_gate: tokio::sync::Mutex<()>,
    /// Re-entrancy guard for `handle_unauthorized`.
    unauthorized_active: AtomicBool,
    /// Richer profile store; empty means a background refresh is warranted.
    profile_cache: Mutex<Option<AuthUser>>,
}

#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<Inner>,
}

impl AuthSession {
    pub fn new(base_url: impl Into<String>, jar: Arc<dyn CookieJar>, names: CookieNames) -> Self {
        let store = Arc::new(CredentialStore::new(jar, names));
        let api = ApiClient::new(base_url, store.clone());
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                state: Mutex::new(AuthState::default()),
                refresh_gate: tokio::sync::Mutex::new(()),
                unauthorized_active: AtomicBool::new(false),
                profile_cache: Mutex::new(None),
            }),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.inner.store
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.inner.state.lock().expect("lock auth state")
    }

    pub fn snapshot(&self) -> AuthState {
        self.state().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Fast path for route middleware: already-ready authenticated state
    /// needs no work; everything else goes through a full refresh.
    pub async fn initialize(&self) -> bool {
        {
            let state = self.state();
            if state.ready && state.is_authenticated() {
                return true;
            }
        }
        self.refresh_session().await
    }

    /// Reconciles cookie, memory, and server state. Idempotent and safe to
    /// call repeatedly; overlapping calls are coalesced onto the gate.
    pub async fn refresh_session(&self) -> bool {
        let _gate = self.inner.refresh_gate.lock().await;

        self.inner.store.hydrate();

        // Promote cookie-derived state into memory where memory is empty.
        {
            let mut state = self.state();
            if state.session_token.is_none() {
                state.session_token = self.inner.store.token();
            }
            if state.current_user.is_none() {
                state.current_user = self.inner.store.user();
            }
            if self.inner.store.has_presence() {
                state.token_available = true;
            }
        }

        // A round trip is only worth it when a session could exist but local
        // state cannot prove it by itself.
        let presence = self.inner.store.has_presence();
        let cookie_token = self.inner.store.token();
        let cookie_user = self.inner.store.user();
        let (memory_token, memory_user) = {
            let state = self.state();
            (state.session_token.clone(), state.current_user.clone())
        };
        let needs_round_trip = presence
            && (memory_token.is_none()
                || cookie_token.is_none()
                || (memory_user.is_none() && cookie_user.is_none()));

        let mut probe_failed = false;
        if needs_round_trip {
            match self.inner.api.session().await {
                Ok(envelope) if !envelope.authenticated => {
                    // The server is authoritative: drop everything.
                    self.clear_session_state();
                    self.state().ready = true;
                    return false;
                }
                Ok(envelope) => {
                    // Backfill from cookies/response without clobbering an
                    // already-present in-memory user.
                    self.inner.store.hydrate();
                    let mut state = self.state();
                    if state.session_token.is_none() {
                        state.session_token = self.inner.store.token();
                    }
                    if state.current_user.is_none() {
                        state.current_user = envelope.user.or(cookie_user);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Session probe failed, keeping local state");
                    probe_failed = true;
                }
            }
        }

        let resolved_token = self.state().session_token.clone();
        match resolved_token {
            Some(_) => {
                self.state().token_available = true;
                self.inner.store.set_token_presence(true);

                // Best-effort: a missing realtime token only degrades
                // realtime features.
                self.fetch_realtime_token().await;

                let user_missing = self.state().current_user.is_none();
                if user_missing {
                    match self.inner.api.profile().await {
                        Ok(payload) => {
                            if let Some(user) = user_from_payload(&payload) {
                                self.adopt_profile(user);
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "Blocking profile fetch failed");
                        }
                    }
                } else if self.inner.profile_cache.lock().expect("lock profile").is_none() {
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.refresh_profile().await;
                    });
                }
            }
            None => {
                // A transport-failed probe with a presence cookie still in
                // place is the one case worth retrying later; everything
                // else without a token is a dead session.
                if !(probe_failed && presence) {
                    self.clear_session_state();
                }
            }
        }

        self.state().ready = true;
        self.is_authenticated()
    }

    /// Submits credentials. Resolves `false` with a user-facing
    /// `login_error` on every failure path; never throws.
    pub async fn login(&self, identifier: &str, password: &str) -> bool {
        if identifier.trim().is_empty() || password.is_empty() {
            self.state().login_error = Some("Identifier and password are required.".to_string());
            return false;
        }

        match self.inner.api.login(identifier.trim(), password).await {
            Ok(body) => {
                let user = user_from_payload(&body);
                let token = token_from_payload(&body);
                match (user, token) {
                    (Some(user), Some(token)) => {
                        self.inner.store.set_user(Some(user.clone()));
                        self.inner.store.set_token(Some(token.as_str()), false);
                        {
                            let mut state = self.state();
                            state.current_user = Some(user);
                            state.session_token = Some(token);
                            state.token_available = true;
                            state.ready = true;
                            state.login_error = None;
                            state.session_message = None;
                        }
                        self.fetch_realtime_token().await;

                        let this = self.clone();
                        tokio::spawn(async move {
                            this.refresh_profile().await;
                        });
                        true
                    }
                    // HTTP success without both a user and a token is still
                    // a failed login.
                    _ => {
                        self.state().login_error = Some(GENERIC_LOGIN_ERROR.to_string());
                        false
                    }
                }
            }
            Err(err) => {
                self.state().login_error = Some(login_error_message(&err));
                false
            }
        }
    }

    /// Clears local state no matter what the server says; returns the path
    /// the caller should navigate to, when redirecting was requested.
    pub async fn logout(&self, options: LogoutOptions) -> Option<String> {
        if let Err(err) = self.inner.api.logout().await {
            tracing::warn!(error = %err, "Server logout failed, clearing locally anyway");
        }

        self.clear_session_state();
        {
            let mut state = self.state();
            state.ready = true;
            if let Some(message) = options.notify {
                state.session_message = Some(message);
            }
        }

        if !options.redirect {
            return None;
        }
        Some(options.redirect_to.unwrap_or_else(|| {
            login_path(options.current_path.as_deref().unwrap_or("/"), None)
        }))
    }

    /// Single recovery path for any downstream 401: remembers where the user
    /// was, logs out without redirecting, and answers the login path with
    /// the original path as the `redirect` query parameter. Concurrent
    /// invocations are dropped by the re-entrancy guard.
    pub async fn handle_unauthorized(
        &self,
        current_path: &str,
        message: Option<String>,
    ) -> Option<String> {
        if self.inner.unauthorized_active.swap(true, Ordering::SeqCst) {
            return None;
        }

        self.state().redirect_target = Some(current_path.to_string());

        let result = self
            .logout(LogoutOptions {
                notify: message,
                redirect: false,
                redirect_to: None,
                current_path: Some(current_path.to_string()),
            })
            .await;
        debug_assert!(result.is_none());

        let target = login_path(current_path, Some(current_path));
        self.inner.unauthorized_active.store(false, Ordering::SeqCst);
        Some(target)
    }

    async fn fetch_realtime_token(&self) {
        match self.inner.api.realtime_token().await {
            Ok(token) => {
                let mut state = self.state();
                state.realtime_token = Some(token.token);
                state.realtime_expires_at = Some(token.expires_at);
            }
            Err(err) => {
                tracing::debug!(error = %err, "Realtime token fetch failed");
                let mut state = self.state();
                state.realtime_token = None;
                state.realtime_expires_at = None;
            }
        }
    }

    /// Background profile refresh; failures are logged and swallowed.
    async fn refresh_profile(&self) {
        match self.inner.api.profile().await {
            Ok(payload) => {
                if let Some(user) = user_from_payload(&payload) {
                    self.adopt_profile(user);
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "Background profile refresh failed");
            }
        }
    }

    fn adopt_profile(&self, user: AuthUser) {
        self.inner.store.set_user(Some(user.clone()));
        *self.inner.profile_cache.lock().expect("lock profile") = Some(user.clone());
        self.state().current_user = Some(user);
    }

    /// Drops every session-scoped field. The redirect target and session
    /// message survive: they exist to outlive the session.
    fn clear_session_state(&self) {
        self.inner.store.clear();
        *self.inner.profile_cache.lock().expect("lock profile") = None;
        let mut state = self.state();
        state.current_user = None;
        state.token_available = false;
        state.session_token = None;
        state.realtime_token = None;
        state.realtime_expires_at = None;
    }
}

/// Detects the locale from a path's first segment.
fn detect_locale(path: &str) -> Option<&str> {
    let first = path.trim_start_matches('/').split('/').next()?;
    KNOWN_LOCALES.iter().find(|l| **l == first).copied()
}

/// Builds the locale-aware login path, optionally carrying the original
/// path as the `redirect` query parameter.
pub fn login_path(current_path: &str, redirect: Option<&str>) -> String {
    let mut path = match detect_locale(current_path) {
        Some(locale) => format!("/{}/login", locale),
        None => "/login".to_string(),
    };
    if let Some(redirect) = redirect {
        path.push_str("?redirect=");
        path.push_str(&urlencoding::encode(redirect));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_authenticated_requires_both_token_and_user() {
        let mut state = AuthState {
            token_available: true,
            ..Default::default()
        };
        assert!(!state.is_authenticated());

        state.current_user = Some(AuthUser {
            id: "1".into(),
            username: "a".into(),
            email: "a@b.c".into(),
            first_name: None,
            last_name: None,
            photo: None,
            roles: None,
            enabled: None,
        });
        assert!(state.is_authenticated());

        state.token_available = false;
        assert!(!state.is_authenticated());
    }

    #[test]
    fn login_path_detects_locale_and_encodes_redirect() {
        assert_eq!(login_path("/de/admin/posts", None), "/de/login");
        assert_eq!(login_path("/admin/posts", None), "/login");
        assert_eq!(
            login_path("/fr/admin/posts", Some("/fr/admin/posts?tab=drafts")),
            "/fr/login?redirect=%2Ffr%2Fadmin%2Fposts%3Ftab%3Ddrafts"
        );
    }

    #[test]
    fn unknown_locale_prefix_falls_back_to_bare_login() {
        assert_eq!(login_path("/xx/admin", None), "/login");
        assert_eq!(login_path("/", None), "/login");
    }
}
