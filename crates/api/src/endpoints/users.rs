//! User relation endpoints.

use axum::{Json, Router, extract::State, routing::post};
use sociograph_common::AppResult;
use sociograph_core::Relationship;
use validator::Validate;

use super::UserIdRequest;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// How the caller relates to another user.
async fn relation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<Relationship>> {
    req.validate()?;

    let relationship = state
        .visibility_service
        .relationship(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(relationship))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/relation", post(relation))
}
