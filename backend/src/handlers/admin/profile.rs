use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{User, UserResponse},
    repositories::user as user_repo,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Partial self-service profile update for the signed-in admin.
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(mut user): Extension<User>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    if let Some(email) = payload.email {
        user.email = email;
    }
    if payload.first_name.is_some() {
        user.first_name = payload.first_name;
    }
    if payload.last_name.is_some() {
        user.last_name = payload.last_name;
    }
    if payload.photo.is_some() {
        user.photo = payload.photo;
    }

    user_repo::write_user(&state.pool, &state.cache, &user).await?;
    Ok(Json(UserResponse::from(user)))
}
