use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppError,
    models::blog::BlogPost,
    repositories::blog as blog_repo,
    state::AppState,
};

pub async fn list_published_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    let posts = blog_repo::list_posts(&state.pool, &state.cache)
        .await?
        .into_iter()
        .filter(|post| post.published)
        .collect();
    Ok(Json(posts))
}

pub async fn get_published_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    let post = blog_repo::read_post(&state.pool, &state.cache, &slug)
        .await?
        .filter(|post| post.published)
        .ok_or_else(|| AppError::NotFound(format!("No post '{}'", slug)))?;
    Ok(Json(post))
}
