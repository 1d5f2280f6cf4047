//! Repository for third-party integration settings (composite key
//! provider+key), with a per-provider cache entry.

use chrono::Utc;
use sqlx::PgPool;

use crate::models::integration::{IntegrationSetting, Provider};
use crate::services::cache::Cache;

const SETTING_COLUMNS: &str = "provider, key, value, is_secret, created_at, updated_at";

fn provider_key(provider: Provider) -> String {
    format!("integration:{}", provider.as_str())
}

pub async fn upsert_setting(
    pool: &PgPool,
    provider: Provider,
    key: &str,
    value: &str,
    is_secret: bool,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO integration_settings (provider, key, value, is_secret, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $5) \
         ON CONFLICT (provider, key) DO UPDATE SET value = $3, is_secret = $4, updated_at = $5",
    )
    .bind(provider.as_str())
    .bind(key)
    .bind(value)
    .bind(is_secret)
    .bind(now)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn settings_for_provider(
    pool: &PgPool,
    provider: Provider,
) -> Result<Vec<IntegrationSetting>, sqlx::Error> {
    sqlx::query_as::<_, IntegrationSetting>(&format!(
        "SELECT {SETTING_COLUMNS} FROM integration_settings WHERE provider = $1 ORDER BY key"
    ))
    .bind(provider.as_str())
    .fetch_all(pool)
    .await
}

pub async fn delete_provider_settings(
    pool: &PgPool,
    provider: Provider,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM integration_settings WHERE provider = $1")
        .bind(provider.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Read-through listing of a provider's settings.
pub async fn read_settings(
    pool: &PgPool,
    cache: &Cache,
    provider: Provider,
) -> Result<Vec<IntegrationSetting>, sqlx::Error> {
    let key = provider_key(provider);
    if let Some(settings) = cache.get_json::<Vec<IntegrationSetting>>(&key).await {
        return Ok(settings);
    }
    let settings = settings_for_provider(pool, provider).await?;
    cache.put_json(&key, &settings).await;
    Ok(settings)
}

/// Upserts a batch of settings, then invalidates the provider cache entry.
pub async fn write_settings(
    pool: &PgPool,
    cache: &Cache,
    provider: Provider,
    settings: &[(&str, String, bool)],
) -> Result<(), sqlx::Error> {
    for (key, value, is_secret) in settings {
        upsert_setting(pool, provider, key, value, *is_secret).await?;
    }
    cache.invalidate(&[&provider_key(provider)]).await;
    Ok(())
}

/// Disconnects a provider: purges its rows and cache entry.
pub async fn purge_provider(
    pool: &PgPool,
    cache: &Cache,
    provider: Provider,
) -> Result<u64, sqlx::Error> {
    let removed = delete_provider_settings(pool, provider).await?;
    cache.invalidate(&[&provider_key(provider)]).await;
    Ok(removed)
}
