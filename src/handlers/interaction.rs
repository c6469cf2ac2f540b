use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extract::AppJson,
    models::comment::CreateCommentRequest,
    services::interaction,
    state::{DynMedia, DynStore},
    utils::jwt::Claims,
};

/// Toggle Like on a post.
pub async fn toggle_like(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let state = interaction::toggle_like(store.as_ref(), claims.user_id()?, post_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Like status toggled successfully",
        "likes_count": state.likes_count,
        "is_liked": state.is_liked,
    })))
}

/// Create a new comment.
pub async fn create_comment(
    State(store): State<DynStore>,
    State(media): State<DynMedia>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = interaction::add_comment(
        store.as_ref(),
        media.as_ref(),
        claims.user_id()?,
        post_id,
        payload.content,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Comment added successfully",
            "comment": comment,
        })),
    ))
}

/// Delete a comment. Author only.
pub async fn delete_comment(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    interaction::delete_comment(store.as_ref(), claims.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
