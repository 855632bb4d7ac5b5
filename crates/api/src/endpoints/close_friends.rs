//! Close friends endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use sociograph_common::{AppResult, Page};
use sociograph_db::entities::close_friend;
use validator::Validate;

use super::{ListRequest, UserIdRequest};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Bulk close-friends body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloseFriendsRequest {
    #[validate(length(max = 1000))]
    pub user_ids: Vec<i64>,
}

/// Close friend response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseFriendItemResponse {
    pub id: i64,
    pub created_at: String,
    pub owner_id: i64,
    pub friend_id: i64,
}

impl From<close_friend::Model> for CloseFriendItemResponse {
    fn from(c: close_friend::Model) -> Self {
        Self {
            id: c.id,
            created_at: c.created_at.to_rfc3339(),
            owner_id: c.owner_id,
            friend_id: c.friend_id,
        }
    }
}

/// Bulk add response.
#[derive(Serialize)]
pub struct AddedResponse {
    pub created: u64,
    pub items: Vec<CloseFriendItemResponse>,
}

/// Bulk remove response.
#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: u64,
    pub items: Vec<CloseFriendItemResponse>,
}

/// Single remove response.
#[derive(Serialize)]
pub struct RemovedOneResponse {
    pub removed: bool,
}

/// Add several users to the caller's close friends.
async fn add(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CloseFriendsRequest>,
) -> AppResult<ApiResponse<AddedResponse>> {
    req.validate()?;

    let change = state
        .close_friend_service
        .add_many(user.id, &req.user_ids)
        .await?;
    Ok(ApiResponse::ok(AddedResponse {
        created: change.count,
        items: change.items.into_iter().map(Into::into).collect(),
    }))
}

/// Remove several users from the caller's close friends.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CloseFriendsRequest>,
) -> AppResult<ApiResponse<RemovedResponse>> {
    req.validate()?;

    let change = state
        .close_friend_service
        .remove_many(user.id, &req.user_ids)
        .await?;
    Ok(ApiResponse::ok(RemovedResponse {
        removed: change.count,
        items: change.items.into_iter().map(Into::into).collect(),
    }))
}

/// Add one user to the caller's close friends.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<CloseFriendItemResponse>> {
    req.validate()?;

    let entry = state.close_friend_service.add(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(entry.into()))
}

/// Remove one user from the caller's close friends.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<RemovedOneResponse>> {
    req.validate()?;

    let removed = state
        .close_friend_service
        .remove(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(RemovedOneResponse { removed }))
}

/// List the caller's close friends.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<CloseFriendItemResponse>>> {
    let page = state
        .close_friend_service
        .list(user.id, &req.own_page(user.id)?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add))
        .route("/remove", post(remove))
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(list))
}
