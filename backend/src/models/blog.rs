//! Blog post models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::PostId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BlogPost {
    pub id: String,
    /// URL-stable identifier, unique.
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub author_name: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(payload: UpsertPostRequest, author_name: String) -> Self {
        let now = Utc::now();
        let published = payload.published.unwrap_or(false);
        Self {
            id: PostId::new().to_string(),
            slug: payload.slug,
            title: payload.title,
            summary: payload.summary,
            body: payload.body,
            author_name,
            published,
            published_at: published.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Admin payload creating or replacing a post.
pub struct UpsertPostRequest {
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub summary: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
    pub published: Option<bool>,
}
