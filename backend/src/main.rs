use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use folio_backend::{
    config::Config,
    db::{connection::create_pool, redis::create_redis_pool},
    docs::ApiDoc,
    handlers,
    middleware as app_middleware,
    repositories::user as user_repo,
    services::cache::Cache,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        caching = config.redis_url.is_some(),
        session_max_age_seconds = config.session_max_age_seconds,
        "Loaded configuration from environment/.env"
    );

    // Initialize database and cache
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_pool = create_redis_pool(&config).await?;
    let cache = Cache::from_redis(redis_pool, config.cache_ttl_seconds);

    // Make sure an admin account exists before the first login attempt.
    user_repo::ensure_default_admin(&pool, &config).await?;

    let state = AppState::new(pool, cache, config.clone());

    // Public routes (no auth)
    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(app_middleware::create_login_rate_limiter(&config));
    let public_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session", get(handlers::auth::session))
        .route("/api/content", get(handlers::content::list_content))
        .route("/api/content/{slug}", get(handlers::content::get_content))
        .route("/api/blog", get(handlers::blog::list_published_posts))
        .route("/api/blog/{slug}", get(handlers::blog::get_published_post));

    // Session-protected routes (any valid session)
    let user_routes = Router::new()
        .route("/api/auth/realtime", get(handlers::auth::realtime_token))
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::session_auth,
        ));

    // Admin routes (admin session; CSRF enforced on mutating verbs)
    let admin_routes = Router::new()
        .route(
            "/api/admin/content/{slug}/{locale}",
            put(handlers::admin::content::upsert_content),
        )
        .route(
            "/api/admin/blog",
            get(handlers::admin::blog::list_posts).post(handlers::admin::blog::create_post),
        )
        .route(
            "/api/admin/blog/{slug}",
            put(handlers::admin::blog::update_post).delete(handlers::admin::blog::delete_post),
        )
        .route(
            "/api/admin/profile",
            put(handlers::admin::profile::update_profile),
        )
        .route(
            "/api/admin/integrations/github",
            get(handlers::admin::integrations::github_status)
                .put(handlers::admin::integrations::github_connect)
                .delete(handlers::admin::integrations::github_disconnect),
        )
        .route(
            "/api/admin/integrations/linkedin",
            get(handlers::admin::integrations::linkedin_status)
                .put(handlers::admin::integrations::linkedin_connect)
                .delete(handlers::admin::integrations::linkedin_disconnect),
        )
        .route(
            "/api/admin/integrations/linkedin/sync",
            post(handlers::admin::integrations::linkedin_sync),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::session_admin,
        ));

    let allow_origin = if config.cors_allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<_> = config
            .cors_allow_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let app = Router::new()
        .merge(login_routes)
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(
                    app_middleware::log_error_responses,
                ))
                .layer(cors),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
