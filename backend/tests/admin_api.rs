use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::{get, put},
    Router,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use folio_backend::{
    handlers,
    middleware as app_middleware,
    models::user::User,
    services::cache::{memory::MemoryStore, Cache},
    services::session::SessionService,
    state::AppState,
};

mod support;

fn admin_app(pool: PgPool) -> (Router, AppState) {
    let cache = Cache::new(Arc::new(MemoryStore::new()), 60);
    let state = AppState::new(pool, cache, support::test_config());
    let router = Router::new()
        .route(
            "/api/admin/content/{slug}/{locale}",
            put(handlers::admin::content::upsert_content),
        )
        .route(
            "/api/admin/blog",
            get(handlers::admin::blog::list_posts).post(handlers::admin::blog::create_post),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::session_admin,
        ))
        .with_state(state.clone());
    (router, state)
}

async fn login_session(state: &AppState, user: &User) -> (String, String) {
    let service = SessionService::new(state);
    let record = service.create_session(user).await.expect("create session");
    (
        format!("folio_session={}", record.token),
        record.csrf_token,
    )
}

fn content_put(cookie: Option<&str>, csrf: Option<&str>, locale: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(format!("/api/admin/content/about/{}", locale))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(csrf) = csrf {
        builder = builder.header("x-csrf-token", csrf);
    }
    builder
        .body(Body::from(
            json!({"document": {"title": "About", "paragraphs": [], "highlights": []}})
                .to_string(),
        ))
        .expect("build request")
}

#[tokio::test]
async fn admin_routes_reject_anonymous_requests() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (app, _state) = admin_app(pool);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/blog")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(content_put(None, None, "en"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_non_admin_sessions() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (app, state) = admin_app(pool.clone());

    let user = support::seed_plain_user(&pool).await;
    let (cookie, _csrf) = login_session(&state, &user).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/blog")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutating_admin_requests_require_matching_csrf_header() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (app, state) = admin_app(pool.clone());

    let user = support::seed_admin(&pool).await;
    let (cookie, csrf) = login_session(&state, &user).await;
    let locale = format!("xx-{}", &Uuid::new_v4().to_string()[..8]);

    // Missing header.
    let response = app
        .clone()
        .oneshot(content_put(Some(&cookie), None, &locale))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong value.
    let response = app
        .clone()
        .oneshot(content_put(Some(&cookie), Some("wrong"), &locale))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Exact match lands the write.
    let response = app
        .clone()
        .oneshot(content_put(Some(&cookie), Some(&csrf), &locale))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Reads need no CSRF header.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/blog")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn content_upsert_rejects_schema_violations() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (app, state) = admin_app(pool.clone());

    let user = support::seed_admin(&pool).await;
    let (cookie, csrf) = login_session(&state, &user).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/admin/content/home-intro/en")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .header("x-csrf-token", &csrf)
                .body(Body::from(
                    json!({"document": {"title": "only a title"}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
