// tests/postgres_store_tests.rs
//
// Needs a live database. Run with:
//   DATABASE_URL=postgres://... cargo test --test postgres_store_tests -- --ignored

use picfeed::{
    models::user::NewUser,
    store::{PgStore, SocialStore},
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> PgStore {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres store tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgStore::new(pool)
}

async fn new_user(store: &PgStore, prefix: &str) -> i64 {
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    store
        .create_user(NewUser {
            name: None,
            username: format!("{}_{}", prefix, suffix),
            email: format!("{}_{}@example.com", prefix, suffix),
            password_hash: "hash".to_string(),
        })
        .await
        .expect("Failed to create user")
        .id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn toggle_like_flips_and_counts() {
    let store = connect().await;
    let author = new_user(&store, "pa").await;
    let liker = new_user(&store, "pb").await;
    let post = store
        .create_post(author, Some("hi".to_string()), "posts/test.png".to_string())
        .await
        .unwrap();

    let on = store.toggle_like(liker, post.id).await.unwrap().unwrap();
    assert!(on.is_liked);
    assert_eq!(on.likes_count, 1);
    assert!(store.liked_post_ids(liker, &[post.id]).await.unwrap().contains(&post.id));

    let off = store.toggle_like(liker, post.id).await.unwrap().unwrap();
    assert!(!off.is_liked);
    assert_eq!(off.likes_count, 0);

    assert!(store.toggle_like(liker, -1).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_toggles_stay_consistent() {
    let store = connect().await;
    let author = new_user(&store, "ca").await;
    let liker = new_user(&store, "cb").await;
    let post = store
        .create_post(author, None, "posts/test.png".to_string())
        .await
        .unwrap();

    let handles: Vec<_> = (0..7)
        .map(|_| {
            let store = store.clone();
            let post_id = post.id;
            tokio::spawn(async move { store.toggle_like(liker, post_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Seven flips from "not liked" end on "liked", with exactly one row.
    let counts = store.post_counts(&[post.id]).await.unwrap();
    assert_eq!(counts[&post.id].likes_count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn delete_post_cascades_to_comments_and_likes() {
    let store = connect().await;
    let author = new_user(&store, "da").await;
    let other = new_user(&store, "db").await;
    let post = store
        .create_post(author, None, "posts/test.png".to_string())
        .await
        .unwrap();
    let comment = store
        .create_comment(post.id, other, "nice".to_string())
        .await
        .unwrap();
    store.toggle_like(other, post.id).await.unwrap();

    assert!(store.delete_post(post.id).await.unwrap());

    assert!(store.find_comment(comment.id).await.unwrap().is_none());
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_maps_to_email_field() {
    let store = connect().await;
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let email = format!("dup_{}@example.com", suffix);

    let first = NewUser {
        name: None,
        username: format!("dup1_{}", suffix),
        email: email.clone(),
        password_hash: "hash".to_string(),
    };
    store.create_user(first).await.unwrap();

    let second = NewUser {
        name: None,
        username: format!("dup2_{}", suffix),
        email,
        password_hash: "hash".to_string(),
    };
    let err = store.create_user(second).await.unwrap_err();
    assert!(matches!(
        err,
        picfeed::store::StoreError::Duplicate { field: "email" }
    ));
}
