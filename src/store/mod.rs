// Persistence seam - every database side effect goes through `SocialStore`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    comment::Comment,
    post::{LikeState, Post, PostCounts},
    user::{NewUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },
}

/// Storage operations for users, posts, comments and likes.
///
/// Reads that feed the view assembler take a slice of ids and answer for all of
/// them at once, so assembling a page costs a fixed number of round trips.
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Insert a user. Fails with `Duplicate` on a taken username or email.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Users with the given ids, in no particular order. Missing ids are skipped.
    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError>;

    async fn create_post(
        &self,
        user_id: i64,
        caption: Option<String>,
        media_path: String,
    ) -> Result<Post, StoreError>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;

    /// Newest first.
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, StoreError>;

    async fn count_posts(&self) -> Result<i64, StoreError>;

    /// Delete a post together with its comments and likes.
    /// Returns false if the post did not exist.
    async fn delete_post(&self, id: i64) -> Result<bool, StoreError>;

    async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: String,
    ) -> Result<Comment, StoreError>;

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError>;

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError>;

    /// The `per_post` most recent comments of each post, returned oldest first
    /// within each post.
    async fn recent_comments(
        &self,
        post_ids: &[i64],
        per_post: i64,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Like and comment totals per post. Posts without rows map to zero.
    async fn post_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, PostCounts>, StoreError>;

    /// Subset of `post_ids` liked by `user_id`, in one existence query.
    async fn liked_post_ids(
        &self,
        user_id: i64,
        post_ids: &[i64],
    ) -> Result<HashSet<i64>, StoreError>;

    /// Atomically flip the (user, post) like. `None` if the post does not exist.
    async fn toggle_like(&self, user_id: i64, post_id: i64)
    -> Result<Option<LikeState>, StoreError>;
}
