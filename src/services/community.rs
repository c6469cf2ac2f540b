// Feed reading, post creation and deletion.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, POSTS_PER_PAGE, Post},
    store::SocialStore,
    utils::media::MediaStorage,
    views::{LoadedComment, LoadedPost, PostView, ViewAssembler, Viewer, can_delete},
};

/// Comments shown under each post in the feed.
pub const FEED_COMMENT_PREVIEW: i64 = 3;
/// Comments shown on a single post.
pub const POST_COMMENT_LIMIT: i64 = 50;

/// Media that already passed format and size checks.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub data: Vec<PostView>,
    pub meta: PageMeta,
}

/// Eager-load authors, counts and the latest `comments_per_post` comments for a batch
/// of posts. The number of store calls does not depend on `posts.len()`.
pub async fn load_posts(
    store: &dyn SocialStore,
    posts: Vec<Post>,
    comments_per_post: i64,
) -> Result<Vec<LoadedPost>, AppError> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }
    let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

    let counts = store.post_counts(&post_ids).await?;
    let comments = store.recent_comments(&post_ids, comments_per_post).await?;

    let mut author_ids: Vec<i64> = posts
        .iter()
        .map(|p| p.user_id)
        .chain(comments.iter().map(|c| c.user_id))
        .collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors: HashMap<i64, _> = store
        .find_users(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut comments_by_post: HashMap<i64, Vec<LoadedComment>> = HashMap::new();
    for comment in comments {
        let author = authors.get(&comment.user_id).cloned();
        comments_by_post
            .entry(comment.post_id)
            .or_default()
            .push(LoadedComment { comment, author });
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let counts = counts.get(&post.id).copied().unwrap_or_default();
            LoadedPost {
                author: authors.get(&post.user_id).cloned(),
                likes_count: Some(counts.likes_count),
                comments_count: Some(counts.comments_count),
                comments: Some(comments_by_post.remove(&post.id).unwrap_or_default()),
                post,
            }
        })
        .collect())
}

/// Posts among `post_ids` the viewer likes. Anonymous viewers never hit the store.
pub async fn liked_set(
    store: &dyn SocialStore,
    viewer: Viewer,
    post_ids: &[i64],
) -> Result<HashSet<i64>, AppError> {
    match viewer {
        Viewer::Anonymous => Ok(HashSet::new()),
        Viewer::Authenticated(user_id) => Ok(store.liked_post_ids(user_id, post_ids).await?),
    }
}

/// One page of the feed, newest first.
pub async fn list_posts(
    store: &dyn SocialStore,
    media: &dyn MediaStorage,
    viewer: Viewer,
    page: i64,
) -> Result<PostPage, AppError> {
    let page = page.max(1);
    let total = store.count_posts().await?;
    let last_page = ((total + POSTS_PER_PAGE - 1) / POSTS_PER_PAGE).max(1);

    // Pages past the end are empty; the offset saturates instead of overflowing.
    let offset = (page - 1).saturating_mul(POSTS_PER_PAGE);
    let posts = if offset < total {
        store.list_posts(POSTS_PER_PAGE, offset).await?
    } else {
        Vec::new()
    };
    let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let liked = liked_set(store, viewer, &post_ids).await?;
    let loaded = load_posts(store, posts, FEED_COMMENT_PREVIEW).await?;

    let assembler = ViewAssembler::new(viewer, &liked, media);
    Ok(PostPage {
        data: loaded.into_iter().map(|p| assembler.post(p)).collect(),
        meta: PageMeta {
            current_page: page,
            last_page,
            per_page: POSTS_PER_PAGE,
            total,
        },
    })
}

pub async fn get_post(
    store: &dyn SocialStore,
    media: &dyn MediaStorage,
    viewer: Viewer,
    post_id: i64,
) -> Result<PostView, AppError> {
    let post = store
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let liked = liked_set(store, viewer, &[post.id]).await?;
    let loaded = load_posts(store, vec![post], POST_COMMENT_LIMIT)
        .await?
        .pop()
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(ViewAssembler::new(viewer, &liked, media).post(loaded))
}

/// Store the media, then create the post row pointing at it.
pub async fn create_post(
    store: &dyn SocialStore,
    media: &dyn MediaStorage,
    user_id: i64,
    caption: Option<String>,
    upload: MediaUpload,
) -> Result<PostView, AppError> {
    let request = CreatePostRequest {
        caption: caption.filter(|c| !c.trim().is_empty()),
    };
    request.validate()?;

    if upload.bytes.is_empty() {
        return Err(AppError::invalid_field("media", "The media field is required."));
    }

    let author = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::AuthError("Unauthenticated.".to_string()))?;

    let media_path = media.store("posts", &upload.bytes, upload.extension).await?;

    let post = match store
        .create_post(user_id, request.caption, media_path.clone())
        .await
    {
        Ok(post) => post,
        Err(e) => {
            if let Err(cleanup) = media.delete(&media_path).await {
                tracing::warn!("Failed to remove orphaned media {}: {:?}", media_path, cleanup);
            }
            return Err(e.into());
        }
    };
    tracing::info!(post_id = post.id, user_id, "Post created");

    let loaded = LoadedPost {
        post,
        author: Some(author),
        likes_count: Some(0),
        comments_count: Some(0),
        comments: Some(Vec::new()),
    };
    let liked = HashSet::new();
    Ok(ViewAssembler::new(Viewer::Authenticated(user_id), &liked, media).post(loaded))
}

/// Delete a post (and, through the store, its comments and likes). Author only.
pub async fn delete_post(
    store: &dyn SocialStore,
    media: &dyn MediaStorage,
    requester_id: i64,
    post_id: i64,
) -> Result<(), AppError> {
    let post = store
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if !can_delete(Viewer::Authenticated(requester_id), post.user_id) {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    if !store.delete_post(post.id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    tracing::info!(post_id = post.id, requester_id, "Post deleted");

    if let Err(e) = media.delete(&post.media_path).await {
        tracing::warn!("Failed to remove media {}: {:?}", post.media_path, e);
    }

    Ok(())
}
