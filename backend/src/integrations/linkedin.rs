//! Thin LinkedIn API client mirroring the GitHub one.

use serde_json::Value;

use super::IntegrationApiError;

pub struct LinkedinClient {
    http: reqwest::Client,
    base_url: String,
}

impl LinkedinClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_profile(&self, token: &str) -> Result<Value, IntegrationApiError> {
        let response = self
            .http
            .get(format!("{}/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IntegrationApiError::Unreachable(e.into()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IntegrationApiError::Rejected);
        }
        if !status.is_success() {
            return Err(IntegrationApiError::Unreachable(anyhow::anyhow!(
                "LinkedIn API returned {}",
                status
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| IntegrationApiError::Unreachable(e.into()))
    }
}
