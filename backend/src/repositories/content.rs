//! Cache-through repository for locale+slug keyed content blocks.
//!
//! Reads fall back to the slug's hard-coded default document when no row
//! exists, and lazily persist that default so later writes have a row to
//! replace. Writes hit PostgreSQL first, then drop the entry and the
//! locale's aggregate list cache, then repopulate the entry.

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;

use crate::models::content::{default_document, ContentBlock};
use crate::services::cache::Cache;

const CONTENT_COLUMNS: &str = "slug, locale, document, created_at, updated_at";

fn entry_key(slug: &str, locale: &str) -> String {
    format!("content:{}:{}", locale, slug)
}

fn list_key(locale: &str) -> String {
    format!("content:{}:all", locale)
}

pub async fn find_content_block(
    pool: &PgPool,
    slug: &str,
    locale: &str,
) -> Result<Option<ContentBlock>, sqlx::Error> {
    sqlx::query_as::<_, ContentBlock>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_blocks WHERE slug = $1 AND locale = $2"
    ))
    .bind(slug)
    .bind(locale)
    .fetch_optional(pool)
    .await
}

pub async fn list_content_blocks(
    pool: &PgPool,
    locale: &str,
) -> Result<Vec<ContentBlock>, sqlx::Error> {
    sqlx::query_as::<_, ContentBlock>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM content_blocks WHERE locale = $1 ORDER BY slug"
    ))
    .bind(locale)
    .fetch_all(pool)
    .await
}

pub async fn upsert_content_block(
    pool: &PgPool,
    slug: &str,
    locale: &str,
    document: &Value,
) -> Result<ContentBlock, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, ContentBlock>(&format!(
        "INSERT INTO content_blocks (slug, locale, document, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $4) \
         ON CONFLICT (slug, locale) DO UPDATE SET document = $3, updated_at = $4 \
         RETURNING {CONTENT_COLUMNS}"
    ))
    .bind(slug)
    .bind(locale)
    .bind(document)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Read-through lookup with default fallback.
///
/// Returns `None` only for slugs that have neither a row nor a default.
pub async fn read_content(
    pool: &PgPool,
    cache: &Cache,
    slug: &str,
    locale: &str,
) -> Result<Option<ContentBlock>, sqlx::Error> {
    let key = entry_key(slug, locale);
    if let Some(block) = cache.get_json::<ContentBlock>(&key).await {
        return Ok(Some(block));
    }

    if let Some(block) = find_content_block(pool, slug, locale).await? {
        cache.put_json(&key, &block).await;
        return Ok(Some(block));
    }

    let Some(default) = default_document(slug) else {
        return Ok(None);
    };

    // First read for a known slug: persist the default so the row exists.
    let block = upsert_content_block(pool, slug, locale, &default).await?;
    cache.invalidate(&[&list_key(locale)]).await;
    cache.put_json(&key, &block).await;
    Ok(Some(block))
}

/// Write-through upsert with invalidation of the entry and the locale list.
pub async fn write_content(
    pool: &PgPool,
    cache: &Cache,
    slug: &str,
    locale: &str,
    document: &Value,
) -> Result<ContentBlock, sqlx::Error> {
    let block = upsert_content_block(pool, slug, locale, document).await?;
    let key = entry_key(slug, locale);
    cache.invalidate(&[&key, &list_key(locale)]).await;
    cache.put_json(&key, &block).await;
    Ok(block)
}

/// Read-through listing of every block persisted for a locale.
pub async fn list_content(
    pool: &PgPool,
    cache: &Cache,
    locale: &str,
) -> Result<Vec<ContentBlock>, sqlx::Error> {
    let key = list_key(locale);
    if let Some(blocks) = cache.get_json::<Vec<ContentBlock>>(&key).await {
        return Ok(blocks);
    }
    let blocks = list_content_blocks(pool, locale).await?;
    cache.put_json(&key, &blocks).await;
    Ok(blocks)
}
