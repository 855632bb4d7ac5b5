//! Concurrency tests against a real `PostgreSQL` store.
//!
//! SQLite test databases run on a single connection, so only a pooled server
//! database lets two graph transactions actually interleave.
//! Run with: `cargo test -p sociograph-core --test postgres_concurrency -- --ignored`
//!
//! Connection settings come from `TEST_DB_*`, see `sociograph_db::test_utils`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sociograph_common::AppError;
use sociograph_core::{FollowResult, GraphServices};
use sociograph_db::{
    entities::{Block, Follow, block, follow, user},
    test_utils::TestDatabase,
};

const ROUNDS: usize = 25;

static NEXT_NAME: AtomicU64 = AtomicU64::new(0);

/// Usernames stay unique across runs against the same database.
fn unique(prefix: &str) -> String {
    let stamp = chrono::Utc::now().timestamp_micros();
    let n = NEXT_NAME.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{stamp}-{n}")
}

async fn setup() -> (TestDatabase, GraphServices) {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let services = GraphServices::new(db.shared());
    (db, services)
}

async fn pair(db: &TestDatabase) -> (user::Model, user::Model) {
    let a = db.user(&unique("a")).await.unwrap();
    let b = db.user(&unique("b")).await.unwrap();
    (a, b)
}

/// Follow and block counters of `user` must equal the size of its edge sets.
async fn assert_counters_consistent(db: &TestDatabase, user: &user::Model) {
    let conn = db.connection();
    let user = db.reload(user.id).await.unwrap();

    let following = Follow::find()
        .filter(follow::Column::FollowerId.eq(user.id))
        .all(conn)
        .await
        .unwrap();
    let followers = Follow::find()
        .filter(follow::Column::FollowingId.eq(user.id))
        .all(conn)
        .await
        .unwrap();
    let blocked = Block::find()
        .filter(block::Column::BlockerId.eq(user.id))
        .all(conn)
        .await
        .unwrap();

    assert_eq!(user.following_count, following.len() as i64);
    assert_eq!(user.followers_count, followers.len() as i64);
    assert_eq!(user.blocked_count, blocked.len() as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_identical_follows_create_one_edge() {
    let (db, svc) = setup().await;
    let (a, b) = pair(&db).await;
    let (a_id, b_id) = (a.id, b.id);

    let tasks = (0..8).map(|_| {
        let following = svc.following.clone();
        tokio::spawn(async move { following.follow(a_id, b_id).await })
    });
    let results: Vec<FollowResult> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let created = results
        .iter()
        .filter(|r| **r == FollowResult::Followed)
        .count();
    assert_eq!(created, 1);
    assert_eq!(db.reload(b.id).await.unwrap().followers_count, 1);
    assert_eq!(db.reload(a.id).await.unwrap().following_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_mutual_unfollow_does_not_deadlock() {
    let (db, svc) = setup().await;

    for _ in 0..ROUNDS {
        let (a, b) = pair(&db).await;
        svc.following.follow(a.id, b.id).await.unwrap();
        svc.following.follow(b.id, a.id).await.unwrap();
        let (a_id, b_id) = (a.id, b.id);

        let forward = {
            let following = svc.following.clone();
            tokio::spawn(async move { following.unfollow(a_id, b_id).await })
        };
        let backward = {
            let following = svc.following.clone();
            tokio::spawn(async move { following.unfollow(b_id, a_id).await })
        };

        forward.await.unwrap().unwrap();
        backward.await.unwrap().unwrap();

        for user in [&a, &b] {
            let user = db.reload(user.id).await.unwrap();
            assert_eq!(user.following_count, 0);
            assert_eq!(user.followers_count, 0);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_block_racing_follow_and_unfollow() {
    let (db, svc) = setup().await;

    for _ in 0..ROUNDS {
        let (a, b) = pair(&db).await;
        svc.following.follow(a.id, b.id).await.unwrap();
        let (a_id, b_id) = (a.id, b.id);

        let block = {
            let blocking = svc.blocking.clone();
            tokio::spawn(async move { blocking.block(a_id, b_id).await })
        };
        let follow_back = {
            let following = svc.following.clone();
            tokio::spawn(async move { following.follow(b_id, a_id).await })
        };
        let unfollow = {
            let following = svc.following.clone();
            tokio::spawn(async move { following.unfollow(a_id, b_id).await })
        };

        block.await.unwrap().unwrap();
        match follow_back.await.unwrap() {
            Ok(FollowResult::Followed) | Err(AppError::InvalidOperation(_)) => {}
            other => panic!("unexpected follow outcome: {other:?}"),
        }
        match unfollow.await.unwrap() {
            Ok(()) | Err(AppError::InvalidOperation(_)) => {}
            other => panic!("unexpected unfollow outcome: {other:?}"),
        }

        let conn = db.connection();
        let remaining = Follow::find()
            .filter(follow::Column::FollowerId.is_in([a.id, b.id]))
            .filter(follow::Column::FollowingId.is_in([a.id, b.id]))
            .all(conn)
            .await
            .unwrap();
        assert!(remaining.is_empty());
        assert_eq!(db.reload(a.id).await.unwrap().blocked_count, 1);
        assert_counters_consistent(&db, &a).await;
        assert_counters_consistent(&db, &b).await;
    }
}
