use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{SocialStore, StoreError};
use crate::models::{
    comment::Comment,
    post::{LikeState, Post, PostCounts},
    user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    /// (user_id, post_id)
    likes: BTreeSet<(i64, i64)>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn like_count(&self, post_id: i64) -> i64 {
        self.likes.iter().filter(|(_, p)| *p == post_id).count() as i64
    }
}

/// In-process store used when no database is configured, and by the test suite.
///
/// All tables sit behind a single lock, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if t.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password_hash,
            avatar_path: None,
            created_at: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(ids.iter().filter_map(|id| t.users.get(id).cloned()).collect())
    }

    async fn create_post(
        &self,
        user_id: i64,
        caption: Option<String>,
        media_path: String,
    ) -> Result<Post, StoreError> {
        let mut t = self.tables.lock().await;
        t.next_post_id += 1;
        let post = Post {
            id: t.next_post_id,
            user_id,
            caption,
            media_path,
            created_at: Utc::now(),
        };
        t.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.tables.lock().await.posts.get(&id).cloned())
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, StoreError> {
        let t = self.tables.lock().await;
        let mut posts: Vec<Post> = t.posts.values().cloned().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        Ok(self.tables.lock().await.posts.len() as i64)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().await;
        if t.posts.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|_, c| c.post_id != id);
        t.likes.retain(|(_, post_id)| *post_id != id);
        Ok(true)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: String,
    ) -> Result<Comment, StoreError> {
        let mut t = self.tables.lock().await;
        t.next_comment_id += 1;
        let comment = Comment {
            id: t.next_comment_id,
            post_id,
            user_id,
            content,
            created_at: Utc::now(),
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        Ok(self.tables.lock().await.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.comments.remove(&id).is_some())
    }

    async fn recent_comments(
        &self,
        post_ids: &[i64],
        per_post: i64,
    ) -> Result<Vec<Comment>, StoreError> {
        let t = self.tables.lock().await;
        let wanted: BTreeSet<i64> = post_ids.iter().copied().collect();
        let mut result = Vec::new();
        for post_id in wanted {
            let mut comments: Vec<&Comment> =
                t.comments.values().filter(|c| c.post_id == post_id).collect();
            comments.sort_by_key(|c| (c.created_at, c.id));
            let skip = comments.len().saturating_sub(per_post.max(0) as usize);
            result.extend(comments.into_iter().skip(skip).cloned());
        }
        Ok(result)
    }

    async fn post_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, PostCounts>, StoreError> {
        let t = self.tables.lock().await;
        Ok(post_ids
            .iter()
            .filter(|id| t.posts.contains_key(*id))
            .map(|&id| {
                let counts = PostCounts {
                    likes_count: t.like_count(id),
                    comments_count: t.comments.values().filter(|c| c.post_id == id).count() as i64,
                };
                (id, counts)
            })
            .collect())
    }

    async fn liked_post_ids(
        &self,
        user_id: i64,
        post_ids: &[i64],
    ) -> Result<HashSet<i64>, StoreError> {
        let t = self.tables.lock().await;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|&post_id| t.likes.contains(&(user_id, post_id)))
            .collect())
    }

    async fn toggle_like(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<Option<LikeState>, StoreError> {
        let mut t = self.tables.lock().await;
        if !t.posts.contains_key(&post_id) {
            return Ok(None);
        }

        let is_liked = if t.likes.remove(&(user_id, post_id)) {
            false
        } else {
            t.likes.insert((user_id, post_id));
            true
        };

        Ok(Some(LikeState {
            likes_count: t.like_count(post_id),
            is_liked,
        }))
    }
}
