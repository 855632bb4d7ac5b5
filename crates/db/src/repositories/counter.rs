//! Counter ledger.
//!
//! The relationship counters on `user` are denormalized copies of edge-set
//! cardinalities. They are only ever written through this module, on the same
//! connection (transaction) as the edge mutation that justifies the change.

use crate::entities::{User, user};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};
use sociograph_common::{AppError, AppResult};

/// A denormalized per-user counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Incoming follow edges.
    Followers,
    /// Outgoing follow edges.
    Following,
    /// Outgoing block edges.
    Blocked,
    /// Outgoing close-friend edges.
    CloseFriends,
}

impl Counter {
    /// The `user` column backing this counter.
    #[must_use]
    pub const fn column(self) -> user::Column {
        match self {
            Self::Followers => user::Column::FollowersCount,
            Self::Following => user::Column::FollowingCount,
            Self::Blocked => user::Column::BlockedCount,
            Self::CloseFriends => user::Column::CloseFriendsCount,
        }
    }

    /// Column name, for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Followers => "followers_count",
            Self::Following => "following_count",
            Self::Blocked => "blocked_count",
            Self::CloseFriends => "close_friends_count",
        }
    }
}

/// Atomic counter updates (single UPDATE per change, no fetch).
pub struct CounterLedger;

impl CounterLedger {
    /// Add `by` to a counter.
    pub async fn increment(
        conn: &impl ConnectionTrait,
        user_id: i64,
        counter: Counter,
        by: i64,
    ) -> AppResult<()> {
        if by == 0 {
            return Ok(());
        }

        let column = counter.column();
        let result = User::update_many()
            .col_expr(column, Expr::col(column).add(by))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(user_id));
        }
        Ok(())
    }

    /// Subtract `by` from a counter.
    ///
    /// The UPDATE only matches while the counter is at least `by`. A miss means
    /// the ledger and the edge set disagree; it is reported as
    /// [`AppError::CounterUnderflow`] so the enclosing transaction rolls back.
    pub async fn decrement(
        conn: &impl ConnectionTrait,
        user_id: i64,
        counter: Counter,
        by: i64,
    ) -> AppResult<()> {
        if by == 0 {
            return Ok(());
        }

        let column = counter.column();
        let result = User::update_many()
            .col_expr(column, Expr::col(column).sub(by))
            .filter(user::Column::Id.eq(user_id))
            .filter(column.gte(by))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            tracing::warn!(
                user_id,
                counter = counter.name(),
                by,
                "Guarded counter decrement matched no row"
            );
            return Err(AppError::CounterUnderflow(format!(
                "{} of user {user_id} is below {by}",
                counter.name()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_increment_by_zero_skips_query() {
        // No exec results queued: any query would fail.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        CounterLedger::increment(&db, 1, Counter::Followers, 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_decrement_applies_when_row_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        CounterLedger::decrement(&db, 1, Counter::Following, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_decrement_below_zero_is_surfaced() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = CounterLedger::decrement(&db, 1, Counter::Blocked, 1).await;
        assert!(matches!(result, Err(AppError::CounterUnderflow(msg)) if msg.contains("blocked_count")));
    }

    #[tokio::test]
    async fn test_increment_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = CounterLedger::increment(&db, 42, Counter::CloseFriends, 2).await;
        assert!(matches!(result, Err(AppError::UserNotFound(42))));
    }

    #[test]
    fn test_counter_names() {
        assert_eq!(Counter::Followers.name(), "followers_count");
        assert_eq!(Counter::CloseFriends.name(), "close_friends_count");
    }
}
