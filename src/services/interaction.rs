// Likes and comments.

use std::collections::HashSet;

use validator::Validate;

use crate::{
    error::AppError,
    models::{comment::CreateCommentRequest, post::LikeState},
    store::SocialStore,
    utils::media::MediaStorage,
    views::{CommentView, LoadedComment, ViewAssembler, Viewer, can_delete},
};

/// Flip the caller's like on a post and report the new totals.
pub async fn toggle_like(
    store: &dyn SocialStore,
    user_id: i64,
    post_id: i64,
) -> Result<LikeState, AppError> {
    store
        .toggle_like(user_id, post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))
}

pub async fn add_comment(
    store: &dyn SocialStore,
    media: &dyn MediaStorage,
    user_id: i64,
    post_id: i64,
    content: String,
) -> Result<CommentView, AppError> {
    let request = CreateCommentRequest { content };
    request.validate()?;

    store
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let comment = store
        .create_comment(post_id, user_id, request.content)
        .await?;
    let author = store.find_user(user_id).await?;

    let liked = HashSet::new();
    Ok(ViewAssembler::new(Viewer::Authenticated(user_id), &liked, media)
        .comment(LoadedComment { comment, author }))
}

/// Only the comment's own author may delete it.
pub async fn delete_comment(
    store: &dyn SocialStore,
    requester_id: i64,
    comment_id: i64,
) -> Result<(), AppError> {
    let comment = store
        .find_comment(comment_id)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if !can_delete(Viewer::Authenticated(requester_id), comment.user_id) {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".to_string(),
        ));
    }

    store.delete_comment(comment.id).await?;
    Ok(())
}
