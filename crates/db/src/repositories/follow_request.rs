//! Follow request repository.
//!
//! One row per ordered `(requester, target)` pair. Only `pending` rows are
//! live; status changes are conditioned on the row still being pending, so two
//! racing decisions on the same request cannot both apply.

use super::edge::EdgeStore;
use crate::entities::{FollowRequest, FollowRequestStatus, follow_request};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
    sea_query::{Expr, OnConflict},
};
use sociograph_common::{AppError, AppResult, Page, PageRequest};

/// Follow request storage. Every call runs on the caller's connection or transaction.
pub struct FollowRequestRepository;

impl FollowRequestRepository {
    /// Find the request for an ordered pair, in any status.
    pub async fn find_pair(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<Option<follow_request::Model>> {
        EdgeStore::find_pair::<FollowRequest>(conn, requester_id, target_id).await
    }

    /// Find the pending request for an ordered pair.
    pub async fn find_pending(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<Option<follow_request::Model>> {
        Ok(Self::find_pair(conn, requester_id, target_id)
            .await?
            .filter(|r| r.status == FollowRequestStatus::Pending))
    }

    /// Make sure a pending request exists for the pair.
    ///
    /// A terminal marker is replaced by a fresh row so the renewed request gets
    /// a new id and lists as the newest. Returns the pending row.
    pub async fn upsert_pending(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<follow_request::Model> {
        if let Some(existing) = Self::find_pair(conn, requester_id, target_id).await? {
            if !existing.status.is_terminal() {
                return Ok(existing);
            }
            FollowRequest::delete_by_id(existing.id)
                .exec(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        let model = follow_request::ActiveModel {
            requester_id: Set(requester_id),
            target_id: Set(target_id),
            status: Set(FollowRequestStatus::Pending),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        // A concurrent identical request may win the insert; either way one
        // pending row exists afterwards.
        FollowRequest::insert(model)
            .on_conflict(
                OnConflict::columns([
                    follow_request::Column::RequesterId,
                    follow_request::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::find_pair(conn, requester_id, target_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "follow request {requester_id} -> {target_id} vanished while being created"
                ))
            })
    }

    /// Move a pending request to a terminal status.
    ///
    /// Returns `false` when no pending request matched.
    pub async fn resolve(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
        status: FollowRequestStatus,
    ) -> AppResult<bool> {
        let result = FollowRequest::update_many()
            .col_expr(follow_request::Column::Status, Expr::value(status))
            .filter(follow_request::Column::RequesterId.eq(requester_id))
            .filter(follow_request::Column::TargetId.eq(target_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the request for the pair if it is still pending.
    pub async fn delete_pending(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<bool> {
        let result = FollowRequest::delete_many()
            .filter(follow_request::Column::RequesterId.eq(requester_id))
            .filter(follow_request::Column::TargetId.eq(target_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the request for the pair whatever its status.
    pub async fn delete_pair(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<u64> {
        FollowRequest::delete_many()
            .filter(follow_request::Column::RequesterId.eq(requester_id))
            .filter(follow_request::Column::TargetId.eq(target_id))
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete requests between two users in both directions.
    pub async fn delete_between(conn: &impl ConnectionTrait, a: i64, b: i64) -> AppResult<u64> {
        FollowRequest::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(follow_request::Column::RequesterId.eq(a))
                            .add(follow_request::Column::TargetId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(follow_request::Column::RequesterId.eq(b))
                            .add(follow_request::Column::TargetId.eq(a)),
                    ),
            )
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending requests addressed to `target_id`, newest first.
    pub async fn list_incoming(
        conn: &impl ConnectionTrait,
        target_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow_request::Model>> {
        EdgeStore::list_page::<FollowRequest>(
            conn,
            Condition::all()
                .add(follow_request::Column::TargetId.eq(target_id))
                .add(follow_request::Column::Status.eq(FollowRequestStatus::Pending)),
            request,
        )
        .await
    }

    /// Pending requests sent by `requester_id`, newest first.
    pub async fn list_outgoing(
        conn: &impl ConnectionTrait,
        requester_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow_request::Model>> {
        EdgeStore::list_page::<FollowRequest>(
            conn,
            Condition::all()
                .add(follow_request::Column::RequesterId.eq(requester_id))
                .add(follow_request::Column::Status.eq(FollowRequestStatus::Pending)),
            request,
        )
        .await
    }
}
