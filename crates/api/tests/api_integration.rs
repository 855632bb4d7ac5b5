//! API integration tests.
//!
//! Drive the router end to end against a migrated in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use serde_json::{Value, json};
use sociograph_api::{AppState, auth_middleware, router as api_router};
use sociograph_db::{entities::user, test_utils::TestDatabase};
use tower::ServiceExt;

/// Create the test router.
fn create_test_router(db: &TestDatabase) -> Router {
    let state = AppState::new(db.shared());
    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn token_of(user: &user::Model) -> String {
    user.token.clone().expect("test users carry a token")
}

async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);

    let (status, body) = post(&app, "/following/create", None, json!({ "userId": 1 })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);

    let (status, _) = post(&app, "/blocking/list", Some("nope"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_follow_and_list_followers() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let alice = db.user("alice").await.unwrap();
    let bob = db.user("bob").await.unwrap();

    let (status, body) = post(
        &app,
        "/following/create",
        Some(&token_of(&alice)),
        json!({ "userId": bob.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "followed");

    let (_, body) = post(
        &app,
        "/following/create",
        Some(&token_of(&alice)),
        json!({ "userId": bob.id }),
    )
    .await;
    assert_eq!(body["data"]["state"], "alreadyFollowing");

    let (status, body) = post(
        &app,
        "/following/followers",
        Some(&token_of(&alice)),
        json!({ "userId": bob.id, "limit": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["followerId"], alice.id);
    assert_eq!(body["data"]["nextCursor"], Value::Null);
}

#[tokio::test]
async fn test_error_taxonomy_over_http() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let alice = db.user("alice").await.unwrap();
    let private = db.private_user("private").await.unwrap();
    let token = token_of(&alice);

    let (status, body) = post(
        &app,
        "/following/create",
        Some(&token),
        json!({ "userId": alice.id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_OPERATION");

    let (status, body) = post(
        &app,
        "/following/create",
        Some(&token),
        json!({ "userId": 987_654 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");

    let (status, body) = post(
        &app,
        "/following/following",
        Some(&token),
        json!({ "userId": private.id }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

    let (status, body) = post(&app, "/following/delete", Some(&token), json!({ "userId": private.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_OPERATION");

    let (status, body) = post(&app, "/following/create", Some(&token), json!({ "userId": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_request_lifecycle_over_http() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let requester = db.user("requester").await.unwrap();
    let private = db.private_user("private").await.unwrap();

    let (_, body) = post(
        &app,
        "/following/create",
        Some(&token_of(&requester)),
        json!({ "userId": private.id }),
    )
    .await;
    assert_eq!(body["data"]["state"], "requestCreated");

    let (_, body) = post(
        &app,
        "/following/requests/incoming",
        Some(&token_of(&private)),
        json!({}),
    )
    .await;
    assert_eq!(body["data"]["items"][0]["requesterId"], requester.id);
    assert_eq!(body["data"]["items"][0]["status"], "pending");

    let (status, body) = post(
        &app,
        "/following/requests/accept",
        Some(&token_of(&private)),
        json!({ "userId": requester.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    let (_, body) = post(
        &app,
        "/users/relation",
        Some(&token_of(&requester)),
        json!({ "userId": private.id }),
    )
    .await;
    assert_eq!(body["data"]["isFollowing"], true);
    assert_eq!(body["data"]["canView"], true);

    let reloaded = db.reload(private.id).await.unwrap();
    assert_eq!(reloaded.followers_count, 1);
}

#[tokio::test]
async fn test_block_and_close_friends_over_http() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let owner = db.user("owner").await.unwrap();
    let x = db.user("x").await.unwrap();
    let y = db.user("y").await.unwrap();
    let token = token_of(&owner);

    let (status, body) = post(
        &app,
        "/close-friends/add",
        Some(&token),
        json!({ "userIds": [x.id, y.id, x.id, owner.id] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 2);

    let (status, body) = post(&app, "/blocking/create", Some(&token), json!({ "userId": y.id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["blockedId"], y.id);

    let (_, body) = post(&app, "/close-friends/list", Some(&token), json!({})).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));

    let (_, body) = post(&app, "/blocking/delete", Some(&token), json!({ "userId": y.id })).await;
    assert_eq!(body["data"]["removed"], true);
    let (_, body) = post(&app, "/blocking/delete", Some(&token), json!({ "userId": y.id })).await;
    assert_eq!(body["data"]["removed"], false);

    let (_, body) = post(&app, "/close-friends/remove", Some(&token), json!({ "userIds": [] })).await;
    assert_eq!(body["data"]["removed"], 0);

    let reloaded = db.reload(owner.id).await.unwrap();
    assert_eq!(reloaded.close_friends_count, 1);
    assert_eq!(reloaded.blocked_count, 0);
}

#[tokio::test]
async fn test_own_lists_validate_the_body() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let alice = db.user("alice").await.unwrap();
    let bob = db.user("bob").await.unwrap();
    let token = token_of(&alice);

    let (status, body) = post(&app, "/blocking/list", Some(&token), json!({ "userId": bob.id })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

    let (status, body) = post(
        &app,
        "/following/requests/incoming",
        Some(&token),
        json!({ "userId": alice.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));

    let (status, body) = post(&app, "/close-friends/list", Some(&token), json!({ "userId": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = post(
        &app,
        "/following/requests/outgoing",
        Some(&token),
        json!({ "cursor": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);

    let (status, _) = post(&app, "/nonexistent/endpoint", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
