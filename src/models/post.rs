use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Number of posts on one feed page.
pub const POSTS_PER_PAGE: i64 = 10;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Author.
    pub user_id: i64,
    pub caption: Option<String>,
    /// Object storage path, written once at creation.
    pub media_path: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new post.
/// The media part is validated separately by the upload handler.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 1000, message = "Caption may not be greater than 1000 characters."))]
    pub caption: Option<String>,
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct PostListParams {
    /// 1-based page number (default: 1).
    pub page: Option<i64>,
}

/// Like/comment totals for one post, computed from the relations at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostCounts {
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Result of flipping a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub likes_count: i64,
    pub is_liked: bool,
}
