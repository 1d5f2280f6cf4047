//! Repository functions for account storage and the default-admin bootstrap.

use chrono::Utc;
use sqlx::PgPool;

use crate::config::Config;
use crate::models::user::{User, ADMIN_ROLE};
use crate::services::cache::Cache;
use crate::utils::password::hash_password;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, photo, \
     roles, enabled, created_at, updated_at";

fn user_cache_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

pub async fn find_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Looks an account up by login identifier (username or email).
pub async fn find_user_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1"
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, first_name, last_name, photo, \
         roles, enabled, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.photo)
    .bind(&user.roles)
    .bind(user.enabled)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn update_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET username = $2, email = $3, first_name = $4, last_name = $5, \
         photo = $6, roles = $7, enabled = $8, updated_at = $9 WHERE id = $1",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.photo)
    .bind(&user.roles)
    .bind(user.enabled)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE enabled AND $1 = ANY(roles)",
    )
    .bind(ADMIN_ROLE)
    .fetch_one(pool)
    .await
}

/// Read-through user lookup by id.
pub async fn read_user(
    pool: &PgPool,
    cache: &Cache,
    user_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    let key = user_cache_key(user_id);
    if let Some(user) = cache.get_json::<User>(&key).await {
        return Ok(Some(user));
    }
    let user = find_user_by_id(pool, user_id).await?;
    if let Some(user) = &user {
        cache.put_json(&key, user).await;
    }
    Ok(user)
}

/// Persists a user update, then invalidates and repopulates its cache entry.
pub async fn write_user(pool: &PgPool, cache: &Cache, user: &User) -> Result<(), sqlx::Error> {
    update_user(pool, user).await?;
    let key = user_cache_key(&user.id);
    cache.invalidate(&[&key]).await;
    cache.put_json(&key, user).await;
    Ok(())
}

/// Creates the configured default admin when no enabled admin exists.
/// Calling it again is a no-op.
pub async fn ensure_default_admin(pool: &PgPool, config: &Config) -> anyhow::Result<()> {
    if count_admins(pool).await? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&config.default_admin_password)?;
    let user = User::new(
        config.default_admin_username.clone(),
        config.default_admin_email.clone(),
        password_hash,
        vec![ADMIN_ROLE.to_string()],
    );

    // A concurrent boot may have inserted one in the meantime; the unique
    // constraints make the second insert lose quietly.
    match insert_user(pool, &user).await {
        Ok(()) => {
            tracing::info!(email = %user.email, "Created default admin account");
            Ok(())
        }
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(()),
        Err(err) => Err(err.into()),
    }
}
