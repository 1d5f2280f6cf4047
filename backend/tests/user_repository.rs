use std::sync::Arc;

use folio_backend::{
    repositories::user as user_repo,
    services::cache::{memory::MemoryStore, Cache},
    utils::password::verify_password,
};
use uuid::Uuid;

mod support;

#[tokio::test]
async fn ensure_default_admin_creates_exactly_one_and_is_idempotent() {
    // An isolated database simulates an empty deployment.
    let pool = support::isolated_pool("bootstrap").await;
    support::migrate_db(&pool).await;

    let mut config = support::test_config();
    config.default_admin_password = "initial-password".into();

    user_repo::ensure_default_admin(&pool, &config)
        .await
        .expect("bootstrap");

    let created = user_repo::find_user_by_identifier(&pool, &config.default_admin_email)
        .await
        .expect("query")
        .expect("default admin exists");
    assert!(created.is_admin());
    assert!(verify_password("initial-password", &created.password_hash).unwrap());

    // Second run is a no-op: still exactly one admin row.
    user_repo::ensure_default_admin(&pool, &config)
        .await
        .expect("bootstrap again");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE 'admin' = ANY(roles)")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 1);

    // And with an admin present, a different identity is not created either.
    let mut other = config.clone();
    other.default_admin_email = format!("other_{}@example.com", Uuid::new_v4());
    other.default_admin_username = format!("other_{}", Uuid::new_v4().simple());
    user_repo::ensure_default_admin(&pool, &other)
        .await
        .expect("bootstrap with admin present");
    let absent = user_repo::find_user_by_identifier(&pool, &other.default_admin_email)
        .await
        .expect("query");
    assert!(absent.is_none());
}

#[tokio::test]
async fn read_user_populates_cache_and_write_refreshes_it() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let store = Arc::new(MemoryStore::new());
    let cache = Cache::new(store.clone(), 60);

    let mut user = support::seed_admin(&pool).await;
    let key = format!("user:{}", user.id);

    let loaded = user_repo::read_user(&pool, &cache, &user.id)
        .await
        .expect("read")
        .expect("user");
    assert_eq!(loaded.id, user.id);
    assert!(store.contains(&key));

    user.first_name = Some("Renamed".into());
    user_repo::write_user(&pool, &cache, &user)
        .await
        .expect("write");

    let reloaded = user_repo::read_user(&pool, &cache, &user.id)
        .await
        .expect("read again")
        .expect("user");
    assert_eq!(reloaded.first_name.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn find_by_identifier_matches_username_and_email() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    let by_username = user_repo::find_user_by_identifier(&pool, &user.username)
        .await
        .expect("query")
        .expect("found");
    let by_email = user_repo::find_user_by_identifier(&pool, &user.email)
        .await
        .expect("query")
        .expect("found");
    assert_eq!(by_username.id, user.id);
    assert_eq!(by_email.id, user.id);

    assert!(user_repo::find_user_by_identifier(&pool, "missing@example.com")
        .await
        .expect("query")
        .is_none());
}
