use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    models::blog::{BlogPost, UpsertPostRequest},
    models::user::User,
    repositories::blog as blog_repo,
    state::AppState,
};

fn author_display_name(user: &User) -> String {
    match (&user.first_name, &user.last_name) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first.clone(),
        _ => user.username.clone(),
    }
}

/// Admin listing includes drafts.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, AppError> {
    let posts = blog_repo::list_posts(&state.pool, &state.cache).await?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpsertPostRequest>,
) -> Result<Json<BlogPost>, AppError> {
    payload.validate()?;
    let post =
        blog_repo::write_post(&state.pool, &state.cache, payload, author_display_name(&user))
            .await?;
    Ok(Json(post))
}

/// The path slug wins over whatever the payload carries.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
    Json(mut payload): Json<UpsertPostRequest>,
) -> Result<Json<BlogPost>, AppError> {
    payload.slug = slug;
    payload.validate()?;
    let post =
        blog_repo::write_post(&state.pool, &state.cache, payload, author_display_name(&user))
            .await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = blog_repo::remove_post(&state.pool, &state.cache, &slug).await?;
    if !removed {
        return Err(AppError::NotFound(format!("No post '{}'", slug)));
    }
    Ok(Json(json!({"message": "Post deleted", "slug": slug})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ADMIN_ROLE;

    #[test]
    fn author_display_name_prefers_full_name() {
        let mut user = User::new(
            "alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            vec![ADMIN_ROLE.into()],
        );
        assert_eq!(author_display_name(&user), "alice");

        user.first_name = Some("Alice".into());
        assert_eq!(author_display_name(&user), "Alice");

        user.last_name = Some("Example".into());
        assert_eq!(author_display_name(&user), "Alice Example");
    }
}
