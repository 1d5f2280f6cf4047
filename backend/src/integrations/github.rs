//! Thin GitHub API client used to validate credentials and read the
//! connected account. Shape mapping beyond a few display fields is out of
//! scope; the raw payload is passed through.

use serde_json::Value;

use super::IntegrationApiError;

pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches the authenticated account. A 401/403 means the token is bad;
    /// anything else that fails means the provider is unreachable.
    pub async fn fetch_account(&self, token: &str) -> Result<Value, IntegrationApiError> {
        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, "folio-backend")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| IntegrationApiError::Unreachable(e.into()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IntegrationApiError::Rejected);
        }
        if !status.is_success() {
            return Err(IntegrationApiError::Unreachable(anyhow::anyhow!(
                "GitHub API returned {}",
                status
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| IntegrationApiError::Unreachable(e.into()))
    }
}
