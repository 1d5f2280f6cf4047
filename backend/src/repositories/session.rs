//! Repository functions for server-held session records.

use sqlx::PgPool;

use crate::models::session::SessionRecord;

const SESSION_COLUMNS: &str = "token, user_id, role, csrf_token, expires_at, created_at";

pub async fn insert_session(pool: &PgPool, record: &SessionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, role, csrf_token, expires_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&record.token)
    .bind(&record.user_id)
    .bind(&record.role)
    .bind(&record.csrf_token)
    .bind(record.expires_at)
    .bind(record.created_at)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn find_session_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = $1"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn delete_session_by_token(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await
        .map(|_| ())
}
