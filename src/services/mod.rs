// src/services/mod.rs

//! Request-scoped operations, written against the `SocialStore` and
//! `MediaStorage` seams so handlers stay thin.

pub mod community;
pub mod interaction;

#[cfg(test)]
mod tests {
    use super::{community, interaction};
    use crate::{
        error::AppError,
        models::user::NewUser,
        store::{MemoryStore, SocialStore},
        utils::media::LocalMediaStorage,
        views::Viewer,
    };

    struct Fixture {
        store: MemoryStore,
        media: LocalMediaStorage,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let media = LocalMediaStorage::new(dir.path(), "http://localhost/storage/").unwrap();
            Self {
                store: MemoryStore::new(),
                media,
                _dir: dir,
            }
        }

        async fn user(&self, username: &str) -> i64 {
            self.store
                .create_user(NewUser {
                    name: None,
                    username: username.into(),
                    email: format!("{username}@example.com"),
                    password_hash: "hash".into(),
                })
                .await
                .unwrap()
                .id
        }

        async fn post(&self, author: i64, caption: &str) -> i64 {
            community::create_post(
                &self.store,
                &self.media,
                author,
                Some(caption.into()),
                community::MediaUpload {
                    bytes: vec![0x89, b'P', b'N', b'G'],
                    extension: "png",
                },
            )
            .await
            .unwrap()
            .id
        }
    }

    #[tokio::test]
    async fn like_then_comment_then_delete_scenario() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let b = fx.user("bob").await;
        let post_id = fx.post(a, "hi").await;

        let state = interaction::toggle_like(&fx.store, b, post_id).await.unwrap();
        assert_eq!((state.likes_count, state.is_liked), (1, true));
        let state = interaction::toggle_like(&fx.store, b, post_id).await.unwrap();
        assert_eq!((state.likes_count, state.is_liked), (0, false));

        let comment = interaction::add_comment(&fx.store, &fx.media, b, post_id, "nice".into())
            .await
            .unwrap();
        assert!(comment.can_delete);

        let seen_by_a = community::get_post(&fx.store, &fx.media, Viewer::Authenticated(a), post_id)
            .await
            .unwrap();
        assert!(seen_by_a.can_delete);
        assert_eq!(seen_by_a.comments.len(), 1);
        assert!(!seen_by_a.comments[0].can_delete);

        community::delete_post(&fx.store, &fx.media, a, post_id).await.unwrap();

        let err = community::get_post(&fx.store, &fx.media, Viewer::Authenticated(b), post_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(fx.store.find_comment(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn is_liked_tracks_the_viewer() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let b = fx.user("bob").await;
        let post_id = fx.post(a, "hi").await;
        interaction::toggle_like(&fx.store, b, post_id).await.unwrap();

        let for_b = community::get_post(&fx.store, &fx.media, Viewer::Authenticated(b), post_id)
            .await
            .unwrap();
        let for_a = community::get_post(&fx.store, &fx.media, Viewer::Authenticated(a), post_id)
            .await
            .unwrap();
        let for_anon = community::get_post(&fx.store, &fx.media, Viewer::Anonymous, post_id)
            .await
            .unwrap();

        assert!(for_b.is_liked);
        assert!(!for_a.is_liked);
        assert!(!for_anon.is_liked && !for_anon.can_delete);
        assert_eq!(for_anon.likes_count, 1);
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let b = fx.user("bob").await;
        let post_id = fx.post(a, "hi").await;
        let comment = interaction::add_comment(&fx.store, &fx.media, b, post_id, "mine".into())
            .await
            .unwrap();

        let err = community::delete_post(&fx.store, &fx.media, b, post_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(fx.store.find_post(post_id).await.unwrap().is_some());

        // The post owner gets no override on other people's comments.
        let err = interaction::delete_comment(&fx.store, a, comment.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        interaction::delete_comment(&fx.store, b, comment.id).await.unwrap();
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;

        assert!(matches!(
            interaction::toggle_like(&fx.store, a, 999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            interaction::add_comment(&fx.store, &fx.media, a, 999, "x".into()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            community::delete_post(&fx.store, &fx.media, a, 999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn comment_length_limits() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let post_id = fx.post(a, "hi").await;

        for (content, ok) in [
            (String::new(), false),
            ("a".repeat(1000), true),
            ("a".repeat(1001), false),
        ] {
            let result = interaction::add_comment(&fx.store, &fx.media, a, post_id, content).await;
            match result {
                Ok(_) => assert!(ok),
                Err(AppError::Validation { errors, .. }) => {
                    assert!(!ok);
                    assert!(errors.contains_key("content"));
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn oversized_caption_is_rejected_before_storing_media() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;

        let result = community::create_post(
            &fx.store,
            &fx.media,
            a,
            Some("c".repeat(1001)),
            community::MediaUpload {
                bytes: vec![1, 2, 3],
                extension: "jpg",
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(fx.store.count_posts().await.unwrap(), 0);
        assert!(!fx.media.root().join("posts").exists());
    }

    #[tokio::test]
    async fn caption_boundaries() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let upload = || community::MediaUpload {
            bytes: vec![1, 2, 3],
            extension: "jpg",
        };

        let at_limit = "é".repeat(1000);
        let post = community::create_post(&fx.store, &fx.media, a, Some(at_limit.clone()), upload())
            .await
            .unwrap();
        assert_eq!(post.caption.as_deref(), Some(at_limit.as_str()));

        let blank = community::create_post(&fx.store, &fx.media, a, Some("   ".into()), upload())
            .await
            .unwrap();
        assert!(blank.caption.is_none());
    }

    #[tokio::test]
    async fn text_is_stored_as_submitted() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let post_id = fx.post(a, "a < b & c").await;

        for content in ["<script>x</script>".to_string(), "<".repeat(1000), "&".repeat(1000)] {
            let comment = interaction::add_comment(&fx.store, &fx.media, a, post_id, content.clone())
                .await
                .unwrap();
            assert_eq!(comment.content, content);
            assert_eq!(comment.content.chars().count(), content.chars().count());
        }

        let post = community::get_post(&fx.store, &fx.media, Viewer::Authenticated(a), post_id)
            .await
            .unwrap();
        assert_eq!(post.caption.as_deref(), Some("a < b & c"));
        assert!(post.comments.iter().all(|c| c.content.chars().count() <= 1000));
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        fx.post(a, "only").await;

        let page = community::list_posts(&fx.store, &fx.media, Viewer::Anonymous, i64::MAX)
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.current_page, i64::MAX);
        assert_eq!((page.meta.last_page, page.meta.total), (1, 1));
    }

    #[tokio::test]
    async fn feed_pages_newest_first() {
        let fx = Fixture::new();
        let a = fx.user("alice").await;
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(fx.post(a, &format!("post {i}")).await);
        }

        let first = community::list_posts(&fx.store, &fx.media, Viewer::Authenticated(a), 1)
            .await
            .unwrap();
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.data[0].id, *ids.last().unwrap());
        assert_eq!((first.meta.current_page, first.meta.last_page, first.meta.total), (1, 2, 12));

        let second = community::list_posts(&fx.store, &fx.media, Viewer::Authenticated(a), 2)
            .await
            .unwrap();
        let second_ids: Vec<i64> = second.data.iter().map(|p| p.id).collect();
        assert_eq!(second_ids, [ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn empty_feed_still_has_one_page() {
        let fx = Fixture::new();
        let page = community::list_posts(&fx.store, &fx.media, Viewer::Anonymous, 0)
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!((page.meta.current_page, page.meta.last_page), (1, 1));
    }
}
