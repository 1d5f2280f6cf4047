use crate::config::Config;
use bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::RedisConnectionManager;
use std::time::Duration;

pub type RedisPool = Pool<RedisConnectionManager>;

/// Builds the cache pool, or `None` when no Redis URL is configured — the
/// repositories then run directly against PostgreSQL.
pub async fn create_redis_pool(config: &Config) -> anyhow::Result<Option<RedisPool>> {
    let Some(url) = &config.redis_url else {
        tracing::info!("Redis URL not set, caching disabled");
        return Ok(None);
    };

    let manager = RedisConnectionManager::new(url.clone())?;
    let pool = Pool::builder()
        .max_size(config.redis_pool_size)
        .connection_timeout(Duration::from_secs(config.redis_connect_timeout))
        .build(manager)
        .await?;

    // Fail fast on a misconfigured URL instead of degrading every request.
    {
        let mut conn = pool.get().await?;
        let _: Option<String> = conn.get("startup-probe").await?;
    }

    tracing::info!(
        pool_size = config.redis_pool_size,
        "Redis connection pool created"
    );
    Ok(Some(pool))
}
