//! Generic cache layer in front of the relational store.
//!
//! The cache is an optional accelerator, never a correctness dependency:
//! when no backend is configured, or when a backend call fails, every
//! operation silently degrades to direct relational-store access. Cached
//! values are idempotent projections of the database, so concurrent misses
//! that redundantly repopulate the same key are harmless.

use std::sync::Arc;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::redis::RedisPool;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let span = tracing::debug_span!("redis_get", key);
        let _enter = span.enter();

        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> anyhow::Result<()> {
        let span = tracing::debug_span!("redis_set_ex", key);
        let _enter = span.enter();

        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let span = tracing::debug_span!("redis_delete", key);
        let _enter = span.enter();

        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// Facade used by the repositories. Holds no backend when caching is
/// disabled, in which case every method is a cheap no-op.
#[derive(Clone)]
pub struct Cache {
    store: Option<Arc<dyn CacheStore>>,
    ttl_seconds: u64,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self {
            store: Some(store),
            ttl_seconds,
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl_seconds: 0,
        }
    }

    pub fn from_redis(pool: Option<RedisPool>, ttl_seconds: u64) -> Self {
        match pool {
            Some(pool) => Self::new(Arc::new(RedisCache::new(pool)), ttl_seconds),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Reads a JSON value. Backend errors and malformed payloads are logged
    /// and reported as a miss so callers rebuild from the relational store.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = match store.get(key).await {
            Ok(value) => value?,
            Err(err) => {
                tracing::warn!(key, error = ?err, "Cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = ?err, "Malformed cache payload, dropping entry");
                let _ = store.delete(key).await;
                None
            }
        }
    }

    /// Best-effort write of a JSON projection with the configured TTL.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = ?err, "Failed to serialize cache payload");
                return;
            }
        };
        if let Err(err) = store.set_ex(key, &raw, self.ttl_seconds).await {
            tracing::warn!(key, error = ?err, "Cache write failed");
        }
    }

    /// Best-effort invalidation of one or more keys.
    pub async fn invalidate(&self, keys: &[&str]) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        for key in keys {
            if let Err(err) = store.delete(key).await {
                tracing::warn!(key, error = ?err, "Cache invalidation failed");
            }
        }
    }
}

pub mod memory {
    //! In-memory store, useful for tests and cache-enabled local runs
    //! without a Redis instance.

    use super::CacheStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().expect("lock entries").contains_key(key)
        }

        pub fn insert_raw(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .expect("lock entries")
                .insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait]
    impl CacheStore for MemoryStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().expect("lock entries").get(key).cloned())
        }

        async fn set_ex(&self, key: &str, value: &str, _ttl_seconds: u64) -> anyhow::Result<()> {
            self.entries
                .lock()
                .expect("lock entries")
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.entries.lock().expect("lock entries").remove(key);
            Ok(())
        }
    }
}
