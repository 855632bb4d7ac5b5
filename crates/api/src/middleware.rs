//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use sea_orm::DatabaseConnection;
use sociograph_core::{
    BlockingService, CloseFriendService, FollowingService, GraphServices, VisibilityService,
};
use sociograph_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Token lookup for authentication.
    pub user_repo: UserRepository,
    pub following_service: FollowingService,
    pub blocking_service: BlockingService,
    pub close_friend_service: CloseFriendService,
    pub visibility_service: VisibilityService,
}

impl AppState {
    /// Wire every service to one shared connection.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let services = GraphServices::new(db.clone());

        Self {
            user_repo: UserRepository::new(db),
            following_service: services.following,
            blocking_service: services.blocking,
            close_friend_service: services.close_friends,
            visibility_service: services.visibility,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; [`AuthUser`](crate::extractors::AuthUser) rejects them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.user_repo.find_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown bearer token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
