use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use chrono::{Duration, Utc};

use folio_backend::{
    repositories::session as session_repo,
    services::cache::{memory::MemoryStore, Cache},
    services::session::{SessionService, CSRF_HEADER},
};

mod support;

fn cookie_for(token: &str) -> String {
    format!("folio_session={}", token)
}

fn service(pool: sqlx::PgPool) -> SessionService {
    let cache = Cache::new(Arc::new(MemoryStore::new()), 60);
    SessionService::from_parts(pool, cache, support::test_config())
}

#[tokio::test]
async fn create_then_get_resolves_user_and_tokens() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    let service = service(pool.clone());
    let record = service.create_session(&user).await.expect("create session");
    assert_ne!(record.token, record.csrf_token);
    assert_eq!(record.role, "admin");

    let session = service
        .get_session(Some(&cookie_for(&record.token)))
        .await
        .expect("get session")
        .expect("session resolves");
    assert_eq!(session.user.id, user.id);
    assert_eq!(session.csrf_token, record.csrf_token);
}

#[tokio::test]
async fn get_session_without_cookie_is_none() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;

    let service = service(pool);
    assert!(service.get_session(None).await.expect("ok").is_none());
    assert!(service
        .get_session(Some("unrelated=1"))
        .await
        .expect("ok")
        .is_none());
}

#[tokio::test]
async fn expired_session_is_deleted_on_access() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    // Insert a record whose expiry has already passed; the next access must
    // report no session and delete the row.
    let record = folio_backend::models::session::SessionRecord {
        token: format!("expired-{}", uuid::Uuid::new_v4()),
        user_id: user.id.clone(),
        role: "admin".into(),
        csrf_token: "csrf".into(),
        expires_at: Utc::now() - Duration::seconds(5),
        created_at: Utc::now() - Duration::hours(2),
    };
    session_repo::insert_session(&pool, &record)
        .await
        .expect("insert expired session");

    let service = service(pool.clone());
    let resolved = service
        .get_session(Some(&cookie_for(&record.token)))
        .await
        .expect("get session");
    assert!(resolved.is_none());

    let stored = session_repo::find_session_by_token(&pool, &record.token)
        .await
        .expect("query");
    assert!(stored.is_none(), "expired record must be deleted");
}

#[tokio::test]
async fn orphaned_session_is_deleted_when_user_is_gone() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    // Bypass the service so the cascade doesn't race the assertion: create
    // the row, remove the user, then access.
    let service = service(pool.clone());
    let record = service.create_session(&user).await.expect("create session");
    support::delete_user(&pool, &user.id).await;

    let resolved = service
        .get_session(Some(&cookie_for(&record.token)))
        .await
        .expect("get session");
    assert!(resolved.is_none());
    assert!(session_repo::find_session_by_token(&pool, &record.token)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn require_admin_rejects_plain_users() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_plain_user(&pool).await;

    let service = service(pool);
    let record = service.create_session(&user).await.expect("create session");

    let result = service
        .require_admin_session(Some(&cookie_for(&record.token)))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn assert_csrf_enforces_single_exact_header() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    let service = service(pool);
    let record = service.create_session(&user).await.expect("create session");
    let cookie = cookie_for(&record.token);

    // Missing header.
    let headers = HeaderMap::new();
    assert!(service.assert_csrf(Some(&cookie), &headers).await.is_err());

    // Repeated header.
    let mut headers = HeaderMap::new();
    headers.append(CSRF_HEADER, HeaderValue::from_str(&record.csrf_token).unwrap());
    headers.append(CSRF_HEADER, HeaderValue::from_str(&record.csrf_token).unwrap());
    assert!(service.assert_csrf(Some(&cookie), &headers).await.is_err());

    // Wrong value.
    let mut headers = HeaderMap::new();
    headers.insert(CSRF_HEADER, HeaderValue::from_static("not-the-token"));
    assert!(service.assert_csrf(Some(&cookie), &headers).await.is_err());

    // Exact match passes.
    let mut headers = HeaderMap::new();
    headers.insert(CSRF_HEADER, HeaderValue::from_str(&record.csrf_token).unwrap());
    let session = service
        .assert_csrf(Some(&cookie), &headers)
        .await
        .expect("csrf passes");
    assert_eq!(session.token, record.token);
}

#[tokio::test]
async fn destroy_session_is_idempotent() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    let service = service(pool.clone());
    let record = service.create_session(&user).await.expect("create session");
    let cookie = cookie_for(&record.token);

    service.destroy_session(Some(&cookie)).await.expect("destroy");
    assert!(session_repo::find_session_by_token(&pool, &record.token)
        .await
        .expect("query")
        .is_none());

    // Second destroy and cookie-less destroy are both no-ops.
    service.destroy_session(Some(&cookie)).await.expect("destroy again");
    service.destroy_session(None).await.expect("destroy without cookie");
}

#[tokio::test]
async fn session_reads_survive_without_cache_backend() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let user = support::seed_admin(&pool).await;

    let service = SessionService::from_parts(pool, Cache::disabled(), support::test_config());
    let record = service.create_session(&user).await.expect("create session");
    let session = service
        .get_session(Some(&cookie_for(&record.token)))
        .await
        .expect("get session")
        .expect("session resolves");
    assert_eq!(session.user.id, user.id);
}
