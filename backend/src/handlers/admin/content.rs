use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppError,
    models::content::{validate_document, ContentBlock, ContentUpsertRequest},
    repositories::content as content_repo,
    state::AppState,
};

pub async fn upsert_content(
    State(state): State<AppState>,
    Path((slug, locale)): Path<(String, String)>,
    Json(payload): Json<ContentUpsertRequest>,
) -> Result<Json<ContentBlock>, AppError> {
    validate_document(&slug, &payload.document).map_err(AppError::Validation)?;

    let block =
        content_repo::write_content(&state.pool, &state.cache, &slug, &locale, &payload.document)
            .await?;
    Ok(Json(block))
}
