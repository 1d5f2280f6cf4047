//! HTTP client for the Folio backend.
//!
//! Cookies flow through the shared credential store's jar: requests carry
//! whatever the jar holds, and `Set-Cookie` response headers are applied
//! back to it, so a server-side session write is visible to the store in
//! the same round trip.

use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::credentials::CredentialStore;

use super::types::{RealtimeToken, SessionEnvelope};

pub const CSRF_HEADER: &str = "x-csrf-token";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
        }
    }

    fn cookie_header(&self) -> Option<String> {
        let names = self.store.names();
        let jar = self.store.jar();
        let pairs: Vec<String> = [&names.token, &names.presence, &names.csrf, &names.user]
            .into_iter()
            .filter_map(|name| jar.get(name).map(|value| format!("{}={}", name, value)))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(cookies) = self.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }
        let mutating =
            method != Method::GET && method != Method::HEAD && method != Method::OPTIONS;
        if mutating {
            if let Some(csrf) = self.store.csrf_token() {
                builder = builder.header(CSRF_HEADER, csrf);
            }
        }
        builder
    }

    fn absorb_cookies(&self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(header) = value.to_str() {
                self.store.apply_set_cookie(header);
            }
        }
    }

    async fn into_error(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str)
                    .map(|s| s.to_string())
            });
        ApiError::Status { status, message }
    }

    async fn expect_success(&self, response: Response) -> Result<Response, ApiError> {
        self.absorb_cookies(&response);
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::into_error(response).await)
        }
    }

    /// Submits credentials form-encoded and returns the raw response body;
    /// the orchestrator decides what counts as a logical success.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Value, ApiError> {
        let response = self
            .request(Method::POST, "/api/auth/login")
            .form(&[("identifier", identifier), ("password", password)])
            .send()
            .await?;
        let response = self.expect_success(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Shape(e.to_string()))
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self.request(Method::POST, "/api/auth/logout").send().await?;
        self.expect_success(response).await.map(|_| ())
    }

    pub async fn session(&self) -> Result<SessionEnvelope, ApiError> {
        let response = self.request(Method::GET, "/api/auth/session").send().await?;
        let response = self.expect_success(response).await?;
        response
            .json::<SessionEnvelope>()
            .await
            .map_err(|e| ApiError::Shape(e.to_string()))
    }

    /// Fetches the full profile. The payload may arrive nested; callers
    /// resolve it with `user_from_payload`.
    pub async fn profile(&self) -> Result<Value, ApiError> {
        let response = self.request(Method::GET, "/api/auth/profile").send().await?;
        let response = self.expect_success(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Shape(e.to_string()))
    }

    pub async fn realtime_token(&self) -> Result<RealtimeToken, ApiError> {
        let response = self
            .request(Method::GET, "/api/auth/realtime")
            .send()
            .await?;
        let response = self.expect_success(response).await?;
        response
            .json::<RealtimeToken>()
            .await
            .map_err(|e| ApiError::Shape(e.to_string()))
    }

    /// Generic authenticated GET used by feature code; 401s bubble up so the
    /// orchestrator's unauthorized handler can take over.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        let response = self.expect_success(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Shape(e.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Maps a failed login to the user-facing message, in precedence order:
/// server-provided message, then rate limiting, then credential rejection,
/// then a generic fallback.
pub fn login_error_message(err: &ApiError) -> String {
    if let ApiError::Status { message, status } = err {
        if let Some(message) = message {
            return message.clone();
        }
        return match status {
            429 => "Too many attempts. Please try again later.".to_string(),
            400 | 401 => "Invalid credentials.".to_string(),
            _ => "Login failed. Please try again.".to_string(),
        };
    }
    "Login failed. Please try again.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16, message: Option<&str>) -> ApiError {
        ApiError::Status {
            status,
            message: message.map(|s| s.to_string()),
        }
    }

    #[test]
    fn login_error_precedence() {
        assert_eq!(
            login_error_message(&status_error(500, Some("backend says no"))),
            "backend says no"
        );
        assert_eq!(
            login_error_message(&status_error(429, None)),
            "Too many attempts. Please try again later."
        );
        assert_eq!(
            login_error_message(&status_error(401, None)),
            "Invalid credentials."
        );
        assert_eq!(
            login_error_message(&status_error(400, None)),
            "Invalid credentials."
        );
        assert_eq!(
            login_error_message(&status_error(503, None)),
            "Login failed. Please try again."
        );
    }
}
