// src/views.rs

//! Client-facing representations of posts and comments.
//!
//! Assembly is a pure transformation: callers fetch the post, whichever
//! relations they need, and the viewer's liked set up front, then hand them
//! to [`ViewAssembler`]. Nothing in here touches the store.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    models::{comment::Comment, post::Post, user::User},
    utils::media::MediaStorage,
};

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Authenticated(i64),
}

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(id) => Some(*id),
        }
    }
}

/// Authorization predicate shared by posts and comments: only the author may delete.
pub fn can_delete(viewer: Viewer, author_id: i64) -> bool {
    matches!(viewer, Viewer::Authenticated(id) if id == author_id)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorView {
    pub id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub author: AuthorView,
    pub can_delete: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub caption: Option<String>,
    pub media_url: String,
    pub author: AuthorView,
    pub likes_count: i64,
    pub comments_count: i64,
    pub comments: Vec<CommentView>,
    pub is_liked: bool,
    pub can_delete: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A comment plus its eagerly loaded author (`None` when not loaded).
#[derive(Debug, Clone)]
pub struct LoadedComment {
    pub comment: Comment,
    pub author: Option<User>,
}

/// A post plus the relations the caller chose to load. `None` means "not loaded".
#[derive(Debug, Clone)]
pub struct LoadedPost {
    pub post: Post,
    pub author: Option<User>,
    pub likes_count: Option<i64>,
    pub comments_count: Option<i64>,
    /// Ordered as the caller wants them rendered.
    pub comments: Option<Vec<LoadedComment>>,
}

impl LoadedPost {
    /// Just the row, no relations.
    pub fn bare(post: Post) -> Self {
        Self {
            post,
            author: None,
            likes_count: None,
            comments_count: None,
            comments: None,
        }
    }
}

pub struct ViewAssembler<'a> {
    viewer: Viewer,
    /// Posts the viewer likes, from one batched existence check. Ignored for anonymous viewers.
    liked: &'a HashSet<i64>,
    media: &'a dyn MediaStorage,
}

impl<'a> ViewAssembler<'a> {
    pub fn new(viewer: Viewer, liked: &'a HashSet<i64>, media: &'a dyn MediaStorage) -> Self {
        Self {
            viewer,
            liked,
            media,
        }
    }

    pub fn post(&self, loaded: LoadedPost) -> PostView {
        let LoadedPost {
            post,
            author,
            likes_count,
            comments_count,
            comments,
        } = loaded;

        let is_liked = match self.viewer {
            Viewer::Anonymous => false,
            Viewer::Authenticated(_) => self.liked.contains(&post.id),
        };

        PostView {
            id: post.id,
            media_url: self.media.url_for(&post.media_path),
            author: self.author(post.user_id, author),
            likes_count: likes_count.unwrap_or(0),
            comments_count: comments_count.unwrap_or(0),
            comments: comments
                .unwrap_or_default()
                .into_iter()
                .map(|c| self.comment(c))
                .collect(),
            is_liked,
            can_delete: can_delete(self.viewer, post.user_id),
            caption: post.caption,
            created_at: post.created_at,
        }
    }

    pub fn comment(&self, loaded: LoadedComment) -> CommentView {
        let LoadedComment { comment, author } = loaded;
        CommentView {
            id: comment.id,
            author: self.author(comment.user_id, author),
            can_delete: can_delete(self.viewer, comment.user_id),
            content: comment.content,
            created_at: comment.created_at,
        }
    }

    /// Falls back to the bare id when the author row was not loaded.
    fn author(&self, author_id: i64, author: Option<User>) -> AuthorView {
        match author {
            Some(user) => AuthorView {
                id: user.id,
                avatar_url: user.avatar_path.as_deref().map(|p| self.media.url_for(p)),
                name: user.name,
                username: Some(user.username),
            },
            None => AuthorView {
                id: author_id,
                name: None,
                username: None,
                avatar_url: None,
            },
        }
    }
}
