use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::PgPool;

use super::{SocialStore, StoreError};
use crate::models::{
    comment::Comment,
    post::{LikeState, Post, PostCounts},
    user::{NewUser, User},
};

const USER_COLUMNS: &str = "id, name, username, email, password, avatar_path, created_at";
const POST_COLUMNS: &str = "id, user_id, caption, media_path, created_at";
const COMMENT_COLUMNS: &str = "id, post_id, user_id, content, created_at";

/// PostgreSQL implementation backed by a `PgPool`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// The `users` field behind a unique constraint name
/// (`users_email_key`, `users_username_key`).
fn duplicate_user_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(c) if c.contains("email") => "email",
        _ => "username",
    }
}

/// Maps a unique violation on `users` to the offending field.
fn map_user_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = duplicate_user_field(db_err.constraint());
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl SocialStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, username, email, password) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(new_user.name)
            .bind(new_user.username)
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_insert_error)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_post(
        &self,
        user_id: i64,
        caption: Option<String>,
        media_path: String,
    ) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts (user_id, caption, media_path) \
             VALUES ($1, $2, $3) \
             RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(user_id)
            .bind(caption)
            .bind(media_path)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, StoreError> {
        // comments and likes go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: String,
    ) -> Result<Comment, StoreError> {
        let sql = format!(
            "INSERT INTO comments (post_id, user_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .bind(user_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_comments(
        &self,
        post_ids: &[i64],
        per_post: i64,
    ) -> Result<Vec<Comment>, StoreError> {
        if post_ids.is_empty() || per_post <= 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM ( \
                 SELECT {COMMENT_COLUMNS}, \
                        ROW_NUMBER() OVER ( \
                            PARTITION BY post_id ORDER BY created_at DESC, id DESC \
                        ) AS rn \
                 FROM comments \
                 WHERE post_id = ANY($1) \
             ) ranked \
             WHERE rn <= $2 \
             ORDER BY post_id, created_at ASC, id ASC"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_ids)
            .bind(per_post)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn post_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, PostCounts>, StoreError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                p.id,
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
                (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
            FROM posts p
            WHERE p.id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, likes_count, comments_count)| {
                (
                    id,
                    PostCounts {
                        likes_count,
                        comments_count,
                    },
                )
            })
            .collect())
    }

    async fn liked_post_ids(
        &self,
        user_id: i64,
        post_ids: &[i64],
    ) -> Result<HashSet<i64>, StoreError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT post_id FROM likes WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn toggle_like(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<Option<LikeState>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the post serializes concurrent toggles of the same pair.
        let post = sqlx::query_scalar::<_, i64>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO likes (user_id, post_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        let likes_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LikeState {
            likes_count,
            is_liked: !removed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_constraints_map_to_user_fields() {
        assert_eq!(duplicate_user_field(Some("users_email_key")), "email");
        assert_eq!(duplicate_user_field(Some("users_username_key")), "username");
        assert_eq!(duplicate_user_field(None), "username");
    }

    #[test]
    fn non_database_errors_pass_through() {
        assert!(matches!(
            map_user_insert_error(sqlx::Error::RowNotFound),
            StoreError::Database(sqlx::Error::RowNotFound)
        ));
    }
}
