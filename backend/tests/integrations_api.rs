use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use sqlx::PgPool;

use folio_backend::{
    models::integration::{keys, Provider},
    repositories::integration as integration_repo,
    services::cache::{memory::MemoryStore, Cache},
};

mod support;

fn cache() -> Cache {
    Cache::new(Arc::new(MemoryStore::new()), 60)
}

async fn reset_provider(pool: &PgPool, cache: &Cache, provider: Provider) {
    integration_repo::purge_provider(pool, cache, provider)
        .await
        .expect("purge");
}

#[tokio::test]
async fn settings_upsert_read_and_purge_roundtrip() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let cache = cache();
    reset_provider(&pool, &cache, Provider::Github).await;

    integration_repo::write_settings(
        &pool,
        &cache,
        Provider::Github,
        &[
            (keys::TOKEN, "ghp_1".to_string(), true),
            (keys::USERNAME, "octocat".to_string(), false),
        ],
    )
    .await
    .expect("write");

    let settings = integration_repo::read_settings(&pool, &cache, Provider::Github)
        .await
        .expect("read");
    assert_eq!(settings.len(), 2);
    let token = settings.iter().find(|s| s.key == keys::TOKEN).unwrap();
    assert!(token.is_secret);

    // Overwriting a key keeps exactly one row per (provider, key).
    integration_repo::write_settings(
        &pool,
        &cache,
        Provider::Github,
        &[(keys::TOKEN, "ghp_2".to_string(), true)],
    )
    .await
    .expect("overwrite");
    let settings = integration_repo::read_settings(&pool, &cache, Provider::Github)
        .await
        .expect("read again");
    assert_eq!(settings.len(), 2);
    let token = settings.iter().find(|s| s.key == keys::TOKEN).unwrap();
    assert_eq!(token.value, "ghp_2");

    let removed = integration_repo::purge_provider(&pool, &cache, Provider::Github)
        .await
        .expect("purge");
    assert_eq!(removed, 2);
    let settings = integration_repo::read_settings(&pool, &cache, Provider::Github)
        .await
        .expect("read after purge");
    assert!(settings.is_empty());
}

#[tokio::test]
async fn github_connect_validates_token_before_persisting() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let cache = cache();
    reset_provider(&pool, &cache, Provider::Github).await;

    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET)
            .path("/user")
            .header("authorization", "Bearer good-token");
        then.status(200)
            .json_body(json!({"login": "octocat", "public_repos": 8}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/user");
        then.status(401).json_body(json!({"message": "Bad credentials"}));
    });

    let client = folio_backend::integrations::github::GithubClient::new(server.base_url());

    // Rejected tokens never reach the settings store.
    let err = client.fetch_account("bad-token").await;
    assert!(matches!(
        err,
        Err(folio_backend::integrations::IntegrationApiError::Rejected)
    ));

    // A validated token yields the account payload the handler persists.
    let account = client.fetch_account("good-token").await.expect("account");
    assert_eq!(account["login"], "octocat");
}

#[tokio::test]
async fn linkedin_sync_stamps_last_synced_at() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let cache = cache();
    reset_provider(&pool, &cache, Provider::Linkedin).await;

    integration_repo::write_settings(
        &pool,
        &cache,
        Provider::Linkedin,
        &[
            (keys::TOKEN, "li-token".to_string(), true),
            (keys::PROFILE_ID, "abc".to_string(), false),
        ],
    )
    .await
    .expect("connect");

    integration_repo::write_settings(
        &pool,
        &cache,
        Provider::Linkedin,
        &[(keys::LAST_SYNCED_AT, chrono::Utc::now().to_rfc3339(), false)],
    )
    .await
    .expect("sync stamp");

    let settings = integration_repo::read_settings(&pool, &cache, Provider::Linkedin)
        .await
        .expect("read");
    assert!(settings.iter().any(|s| s.key == keys::LAST_SYNCED_AT));
}
