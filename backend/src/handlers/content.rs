use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppError,
    models::content::ContentBlock,
    repositories::content as content_repo,
    state::AppState,
};

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Deserialize, IntoParams)]
pub struct LocaleQuery {
    /// BCP 47-ish locale tag; defaults to "en".
    pub locale: Option<String>,
}

impl LocaleQuery {
    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }
}

pub async fn get_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ContentBlock>, AppError> {
    let block = content_repo::read_content(&state.pool, &state.cache, &slug, query.locale())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No content for slug '{}'", slug)))?;
    Ok(Json(block))
}

pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<Vec<ContentBlock>>, AppError> {
    let blocks = content_repo::list_content(&state.pool, &state.cache, query.locale()).await?;
    Ok(Json(blocks))
}
