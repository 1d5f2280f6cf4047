use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::{
    error::AppError,
    integrations::{github::GithubClient, linkedin::LinkedinClient, IntegrationApiError},
    models::integration::{
        keys, GithubConnectRequest, IntegrationSetting, IntegrationStatus, LinkedinConnectRequest,
        Provider,
    },
    repositories::integration as integration_repo,
    state::AppState,
};

fn setting<'a>(settings: &'a [IntegrationSetting], key: &str) -> Option<&'a str> {
    settings
        .iter()
        .find(|s| s.key == key)
        .map(|s| s.value.as_str())
}

fn timestamp(settings: &[IntegrationSetting], key: &str) -> Option<DateTime<Utc>> {
    setting(settings, key).and_then(|v| v.parse().ok())
}

/// Projects stored settings into client-visible state. Secret values are
/// never included; only their presence matters for `connected`.
fn status_from(
    provider: Provider,
    settings: &[IntegrationSetting],
    account: Option<Value>,
) -> IntegrationStatus {
    let mut visible = Map::new();
    for s in settings.iter().filter(|s| !s.is_secret) {
        if s.key != keys::CONNECTED_AT && s.key != keys::LAST_SYNCED_AT {
            visible.insert(s.key.clone(), Value::String(s.value.clone()));
        }
    }
    IntegrationStatus {
        provider,
        connected: setting(settings, keys::TOKEN).is_some(),
        connected_at: timestamp(settings, keys::CONNECTED_AT),
        last_synced_at: timestamp(settings, keys::LAST_SYNCED_AT),
        settings: Value::Object(visible),
        account,
    }
}

fn connect_error(err: IntegrationApiError) -> AppError {
    match err {
        IntegrationApiError::Rejected => {
            AppError::BadRequest("Provider rejected the credentials".to_string())
        }
        IntegrationApiError::Unreachable(err) => {
            tracing::warn!(error = ?err, "Integration provider unreachable");
            AppError::ServiceUnavailable("Provider is unreachable".to_string())
        }
    }
}

// --- GitHub ---

pub async fn github_status(
    State(state): State<AppState>,
) -> Result<Json<IntegrationStatus>, AppError> {
    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Github).await?;

    // Live account data is merged best-effort; a broken token does not turn
    // the status read into an error.
    let mut account = None;
    if let Some(token) = setting(&settings, keys::TOKEN) {
        let client = GithubClient::new(state.config.github_api_base_url.clone());
        match client.fetch_account(token).await {
            Ok(data) => account = Some(data),
            Err(err) => tracing::warn!(error = ?err, "GitHub account fetch failed"),
        }
    }

    Ok(Json(status_from(Provider::Github, &settings, account)))
}

pub async fn github_connect(
    State(state): State<AppState>,
    Json(payload): Json<GithubConnectRequest>,
) -> Result<Json<IntegrationStatus>, AppError> {
    payload.validate()?;

    // Validate against the provider before anything is persisted.
    let client = GithubClient::new(state.config.github_api_base_url.clone());
    let account = client
        .fetch_account(&payload.token)
        .await
        .map_err(connect_error)?;

    let username = account
        .get("login")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    integration_repo::write_settings(
        &state.pool,
        &state.cache,
        Provider::Github,
        &[
            (keys::TOKEN, payload.token, true),
            (keys::USERNAME, username, false),
            (keys::CONNECTED_AT, Utc::now().to_rfc3339(), false),
        ],
    )
    .await?;

    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Github).await?;
    Ok(Json(status_from(Provider::Github, &settings, Some(account))))
}

pub async fn github_disconnect(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let removed =
        integration_repo::purge_provider(&state.pool, &state.cache, Provider::Github).await?;
    Ok(Json(json!({"message": "Disconnected", "removed": removed})))
}

// --- LinkedIn ---

pub async fn linkedin_status(
    State(state): State<AppState>,
) -> Result<Json<IntegrationStatus>, AppError> {
    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Linkedin).await?;

    let mut account = None;
    if let Some(token) = setting(&settings, keys::TOKEN) {
        let client = LinkedinClient::new(state.config.linkedin_api_base_url.clone());
        match client.fetch_profile(token).await {
            Ok(data) => account = Some(data),
            Err(err) => tracing::warn!(error = ?err, "LinkedIn profile fetch failed"),
        }
    }

    Ok(Json(status_from(Provider::Linkedin, &settings, account)))
}

pub async fn linkedin_connect(
    State(state): State<AppState>,
    Json(payload): Json<LinkedinConnectRequest>,
) -> Result<Json<IntegrationStatus>, AppError> {
    payload.validate()?;

    let client = LinkedinClient::new(state.config.linkedin_api_base_url.clone());
    let profile = client
        .fetch_profile(&payload.token)
        .await
        .map_err(connect_error)?;

    integration_repo::write_settings(
        &state.pool,
        &state.cache,
        Provider::Linkedin,
        &[
            (keys::TOKEN, payload.token, true),
            (keys::PROFILE_ID, payload.profile_id, false),
            (keys::CONNECTED_AT, Utc::now().to_rfc3339(), false),
        ],
    )
    .await?;

    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Linkedin).await?;
    Ok(Json(status_from(
        Provider::Linkedin,
        &settings,
        Some(profile),
    )))
}

pub async fn linkedin_disconnect(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let removed =
        integration_repo::purge_provider(&state.pool, &state.cache, Provider::Linkedin).await?;
    Ok(Json(json!({"message": "Disconnected", "removed": removed})))
}

/// Pulls fresh profile data and stamps `last_synced_at`.
pub async fn linkedin_sync(
    State(state): State<AppState>,
) -> Result<Json<IntegrationStatus>, AppError> {
    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Linkedin).await?;
    let token = setting(&settings, keys::TOKEN)
        .ok_or_else(|| AppError::BadRequest("LinkedIn is not connected".to_string()))?
        .to_string();

    let client = LinkedinClient::new(state.config.linkedin_api_base_url.clone());
    let profile = client.fetch_profile(&token).await.map_err(connect_error)?;

    integration_repo::write_settings(
        &state.pool,
        &state.cache,
        Provider::Linkedin,
        &[(keys::LAST_SYNCED_AT, Utc::now().to_rfc3339(), false)],
    )
    .await?;

    let settings =
        integration_repo::read_settings(&state.pool, &state.cache, Provider::Linkedin).await?;
    Ok(Json(status_from(
        Provider::Linkedin,
        &settings,
        Some(profile),
    )))
}
