//! Following endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use sociograph_common::{AppResult, Page};
use sociograph_core::{FollowResult, RequestState};
use sociograph_db::entities::{FollowRequestStatus, follow, follow_request};
use validator::Validate;

use super::{ListRequest, UserIdRequest};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Follow result response.
#[derive(Serialize)]
pub struct FollowResponse {
    pub state: FollowResult,
}

/// Request transition response.
#[derive(Serialize)]
pub struct RequestStateResponse {
    pub status: RequestState,
}

/// Follow edge response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowItemResponse {
    pub id: i64,
    pub created_at: String,
    pub follower_id: i64,
    pub following_id: i64,
}

impl From<follow::Model> for FollowItemResponse {
    fn from(f: follow::Model) -> Self {
        Self {
            id: f.id,
            created_at: f.created_at.to_rfc3339(),
            follower_id: f.follower_id,
            following_id: f.following_id,
        }
    }
}

/// Follow request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequestItemResponse {
    pub id: i64,
    pub created_at: String,
    pub requester_id: i64,
    pub target_id: i64,
    pub status: FollowRequestStatus,
}

impl From<follow_request::Model> for FollowRequestItemResponse {
    fn from(r: follow_request::Model) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at.to_rfc3339(),
            requester_id: r.requester_id,
            target_id: r.target_id,
            status: r.status,
        }
    }
}

/// Follow a user.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<FollowResponse>> {
    req.validate()?;

    let result = state.following_service.follow(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(FollowResponse { state: result }))
}

/// Unfollow a user.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;

    state.following_service.unfollow(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Remove one of the caller's followers.
async fn remove_follower(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;

    state
        .following_service
        .remove_follower(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Accept a follow request.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<RequestStateResponse>> {
    req.validate()?;

    let status = state
        .following_service
        .accept_request(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(RequestStateResponse { status }))
}

/// Reject a follow request.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<RequestStateResponse>> {
    req.validate()?;

    let status = state
        .following_service
        .reject_request(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(RequestStateResponse { status }))
}

/// Cancel a follow request.
async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<RequestStateResponse>> {
    req.validate()?;

    let status = state
        .following_service
        .cancel_request(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(RequestStateResponse { status }))
}

/// Pending requests addressed to the caller.
async fn incoming(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<FollowRequestItemResponse>>> {
    let page = state
        .following_service
        .list_incoming_requests(user.id, &req.own_page(user.id)?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Pending requests sent by the caller.
async fn outgoing(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<FollowRequestItemResponse>>> {
    let page = state
        .following_service
        .list_outgoing_requests(user.id, &req.own_page(user.id)?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Get followers of a user.
async fn followers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<FollowItemResponse>>> {
    req.validate()?;

    let target_id = req.user_id.unwrap_or(user.id);
    let page = state
        .following_service
        .list_followers(user.id, target_id, &req.page())
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Get users that a user is following.
async fn following(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<FollowItemResponse>>> {
    req.validate()?;

    let target_id = req.user_id.unwrap_or(user.id);
    let page = state
        .following_service
        .list_following(user.id, target_id, &req.page())
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(follow))
        .route("/delete", post(unfollow))
        .route("/remove-follower", post(remove_follower))
        .route("/requests/accept", post(accept))
        .route("/requests/reject", post(reject))
        .route("/requests/cancel", post(cancel))
        .route("/requests/incoming", post(incoming))
        .route("/requests/outgoing", post(outgoing))
        .route("/followers", post(followers))
        .route("/following", post(following))
}
