//! Blocking endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use sociograph_common::{AppResult, Page};
use sociograph_db::entities::block;
use validator::Validate;

use super::{ListRequest, UserIdRequest};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Block response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockItemResponse {
    pub id: i64,
    pub created_at: String,
    pub blocker_id: i64,
    pub blocked_id: i64,
}

impl From<block::Model> for BlockItemResponse {
    fn from(b: block::Model) -> Self {
        Self {
            id: b.id,
            created_at: b.created_at.to_rfc3339(),
            blocker_id: b.blocker_id,
            blocked_id: b.blocked_id,
        }
    }
}

/// Unblock response.
#[derive(Serialize)]
pub struct UnblockResponse {
    pub removed: bool,
}

/// Block a user.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<BlockItemResponse>> {
    req.validate()?;

    let block = state.blocking_service.block(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(block.into()))
}

/// Unblock a user.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<UnblockResponse>> {
    req.validate()?;

    let removed = state.blocking_service.unblock(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(UnblockResponse { removed }))
}

/// List users the caller blocks.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Page<BlockItemResponse>>> {
    let page = state
        .blocking_service
        .list_blocked(user.id, &req.own_page(user.id)?)
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(list))
}
