use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    models::user::MeResponse,
    state::{DynMedia, DynStore},
    utils::jwt::Claims,
};

/// Get the authenticated user's profile.
pub async fn get_me(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user(claims.user_id()?)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: user.id,
        avatar_url: user.avatar_path.as_deref().map(|p| media.url_for(p)),
        name: user.name,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }))
}
