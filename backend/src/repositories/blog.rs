//! Cache-through repository for blog posts.

use chrono::Utc;
use sqlx::PgPool;

use crate::models::blog::{BlogPost, UpsertPostRequest};
use crate::services::cache::Cache;

const POST_COLUMNS: &str = "id, slug, title, summary, body, author_name, published, \
     published_at, created_at, updated_at";

fn entry_key(slug: &str) -> String {
    format!("blog:{}", slug)
}

const LIST_KEY: &str = "blog:all";

pub async fn find_post_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn list_all_posts(pool: &PgPool) -> Result<Vec<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn delete_post_by_slug(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
        .bind(slug)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn upsert_post_row(
    pool: &PgPool,
    post: &BlogPost,
) -> Result<BlogPost, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "INSERT INTO blog_posts (id, slug, title, summary, body, author_name, published, \
         published_at, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (slug) DO UPDATE SET \
             title = $3, summary = $4, body = $5, author_name = $6, published = $7, \
             published_at = $8, updated_at = $10 \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(&post.id)
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.summary)
    .bind(&post.body)
    .bind(&post.author_name)
    .bind(post.published)
    .bind(post.published_at)
    .bind(post.created_at)
    .bind(post.updated_at)
    .fetch_one(pool)
    .await
}

/// Read-through lookup by slug.
pub async fn read_post(
    pool: &PgPool,
    cache: &Cache,
    slug: &str,
) -> Result<Option<BlogPost>, sqlx::Error> {
    let key = entry_key(slug);
    if let Some(post) = cache.get_json::<BlogPost>(&key).await {
        return Ok(Some(post));
    }
    let post = find_post_by_slug(pool, slug).await?;
    if let Some(post) = &post {
        cache.put_json(&key, post).await;
    }
    Ok(post)
}

/// Read-through listing of every post. Admin callers see drafts; public
/// handlers filter on `published`.
pub async fn list_posts(pool: &PgPool, cache: &Cache) -> Result<Vec<BlogPost>, sqlx::Error> {
    if let Some(posts) = cache.get_json::<Vec<BlogPost>>(LIST_KEY).await {
        return Ok(posts);
    }
    let posts = list_all_posts(pool).await?;
    cache.put_json(LIST_KEY, &posts).await;
    Ok(posts)
}

/// Upserts a post, keeping an existing row's identity and publication
/// timestamp where that makes sense, then invalidates the entry and the
/// aggregate list before repopulating the entry.
pub async fn write_post(
    pool: &PgPool,
    cache: &Cache,
    payload: UpsertPostRequest,
    author_name: String,
) -> Result<BlogPost, sqlx::Error> {
    let existing = find_post_by_slug(pool, &payload.slug).await?;

    let post = match existing {
        Some(mut current) => {
            let published = payload.published.unwrap_or(current.published);
            if published && !current.published {
                current.published_at = Some(Utc::now());
            } else if !published {
                current.published_at = None;
            }
            current.title = payload.title;
            current.summary = payload.summary;
            current.body = payload.body;
            current.author_name = author_name;
            current.published = published;
            current.updated_at = Utc::now();
            current
        }
        None => BlogPost::new(payload, author_name),
    };

    let stored = upsert_post_row(pool, &post).await?;
    let key = entry_key(&stored.slug);
    cache.invalidate(&[&key, LIST_KEY]).await;
    cache.put_json(&key, &stored).await;
    Ok(stored)
}

/// Deletes a post and drops its entry plus the aggregate list cache.
pub async fn remove_post(
    pool: &PgPool,
    cache: &Cache,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    let removed = delete_post_by_slug(pool, slug).await?;
    if removed {
        cache.invalidate(&[&entry_key(slug), LIST_KEY]).await;
    }
    Ok(removed)
}
