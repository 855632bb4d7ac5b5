//! Edge store.
//!
//! Follow, block and close-friend relations share one storage shape: an
//! auto-increment id, an ordered `(source, target)` pair under a unique index,
//! and `created_at`. [`EdgeStore`] implements create/delete/list once for all of
//! them, and keeps each relation's counters in step with its rows.
//!
//! Inserts use `ON CONFLICT DO NOTHING`, so losing a race against an identical
//! insert shows up as [`LinkOutcome::AlreadyExists`] rather than as an error.
//!
//! Counter updates lock user rows in source, target order. Callers mutating a
//! pair inside a transaction lock both users first with
//! [`UserRepository::lock_users`](super::UserRepository::lock_users).

use std::sync::Arc;

use super::counter::{Counter, CounterLedger};
use crate::entities::{block, close_friend, follow, follow_request};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityName, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    entity::prelude::DateTimeWithTimeZone,
    sea_query::{OnConflict, Query, SimpleExpr},
};
use sociograph_common::{AppError, AppResult, Page, PageRequest};

/// A directed relation stored as one row per ordered user pair.
pub trait Edge: EntityTrait {
    /// Auto-increment id column (the listing cursor).
    fn id_column() -> Self::Column;
    /// Column holding the acting user.
    fn source_column() -> Self::Column;
    /// Column holding the user acted upon.
    fn target_column() -> Self::Column;
    /// Creation timestamp column.
    fn created_at_column() -> Self::Column;
    /// Id of a fetched row.
    fn edge_id(model: &Self::Model) -> i64;
    /// `(source, target)` of a fetched row.
    fn endpoints(model: &Self::Model) -> (i64, i64);
}

/// An edge whose cardinality is mirrored by user counters.
pub trait CountedEdge: Edge {
    /// Counter on the source user, one per outgoing edge.
    const SOURCE_COUNTER: Option<Counter>;
    /// Counter on the target user, one per incoming edge.
    const TARGET_COUNTER: Option<Counter>;
}

/// Result of an idempotent edge insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new row was written and counters were bumped.
    Created,
    /// The pair was already linked; nothing changed.
    AlreadyExists,
}

impl LinkOutcome {
    /// Whether this call wrote the row.
    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Transactional access to relationship edges.
#[derive(Clone)]
pub struct EdgeStore {
    db: Arc<DatabaseConnection>,
}

impl EdgeStore {
    /// Create a new edge store.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The pooled connection, for reads outside a transaction.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Begin a transaction. Dropping it without [`EdgeStore::commit`] rolls back.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Commit a transaction.
    pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the edge for an ordered pair.
    pub async fn find_pair<E: Edge>(
        conn: &impl ConnectionTrait,
        source: i64,
        target: i64,
    ) -> AppResult<Option<E::Model>> {
        E::find()
            .filter(E::source_column().eq(source))
            .filter(E::target_column().eq(target))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether an ordered pair is linked.
    pub async fn exists<E: Edge>(
        conn: &impl ConnectionTrait,
        source: i64,
        target: i64,
    ) -> AppResult<bool> {
        Ok(Self::find_pair::<E>(conn, source, target).await?.is_some())
    }

    /// Check whether either direction of a pair is linked.
    pub async fn exists_between<E: Edge>(
        conn: &impl ConnectionTrait,
        a: i64,
        b: i64,
    ) -> AppResult<bool> {
        Ok(Self::exists::<E>(conn, a, b).await? || Self::exists::<E>(conn, b, a).await?)
    }

    /// Of `targets`, those already linked from `source`.
    pub async fn linked_targets<E: Edge>(
        conn: &impl ConnectionTrait,
        source: i64,
        targets: &[i64],
    ) -> AppResult<Vec<E::Model>> {
        if targets.is_empty() {
            return Ok(vec![]);
        }

        E::find()
            .filter(E::source_column().eq(source))
            .filter(E::target_column().is_in(targets.iter().copied()))
            .order_by_desc(E::id_column())
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Of `candidates`, those linked with `user` in either direction.
    pub async fn linked_either_way<E: Edge>(
        conn: &impl ConnectionTrait,
        user: i64,
        candidates: &[i64],
    ) -> AppResult<Vec<i64>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let rows = E::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(E::source_column().eq(user))
                            .add(E::target_column().is_in(candidates.iter().copied())),
                    )
                    .add(
                        Condition::all()
                            .add(E::target_column().eq(user))
                            .add(E::source_column().is_in(candidates.iter().copied())),
                    ),
            )
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut partners: Vec<i64> = rows
            .iter()
            .map(|row| {
                let (source, target) = E::endpoints(row);
                if source == user { target } else { source }
            })
            .collect();
        partners.sort_unstable();
        partners.dedup();
        Ok(partners)
    }

    /// Insert `source -> target` and bump the relation's counters if the row is new.
    pub async fn link<E: CountedEdge>(
        conn: &impl ConnectionTrait,
        source: i64,
        target: i64,
    ) -> AppResult<LinkOutcome> {
        let inserted = Self::link_many::<E>(conn, source, &[target]).await?;
        Ok(if inserted.is_empty() {
            LinkOutcome::AlreadyExists
        } else {
            LinkOutcome::Created
        })
    }

    /// Insert `source -> t` for every `t` in `targets`, skipping pairs that exist.
    ///
    /// Returns the targets actually inserted. Counters move by exactly that many.
    pub async fn link_many<E: CountedEdge>(
        conn: &impl ConnectionTrait,
        source: i64,
        targets: &[i64],
    ) -> AppResult<Vec<i64>> {
        if targets.is_empty() {
            return Ok(vec![]);
        }

        let created_at: DateTimeWithTimeZone = Utc::now().into();
        let mut insert = Query::insert();
        insert
            .into_table(E::default().table_ref())
            .columns([
                E::source_column(),
                E::target_column(),
                E::created_at_column(),
            ])
            .on_conflict(
                OnConflict::columns([E::source_column(), E::target_column()])
                    .do_nothing()
                    .to_owned(),
            )
            .returning_col(E::target_column());

        for target in targets {
            insert
                .values([
                    SimpleExpr::from(source),
                    SimpleExpr::from(*target),
                    SimpleExpr::from(created_at),
                ])
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        let statement = conn.get_database_backend().build(&insert);
        let rows = conn
            .query_all(statement)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let inserted = rows
            .iter()
            .map(|row| row.try_get_by_index::<i64>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(counter) = E::SOURCE_COUNTER {
            CounterLedger::increment(conn, source, counter, inserted.len() as i64).await?;
        }
        if let Some(counter) = E::TARGET_COUNTER {
            for target in &inserted {
                CounterLedger::increment(conn, *target, counter, 1).await?;
            }
        }

        Ok(inserted)
    }

    /// Delete `source -> target` and apply the matching decrements if a row was removed.
    pub async fn unlink<E: CountedEdge>(
        conn: &impl ConnectionTrait,
        source: i64,
        target: i64,
    ) -> AppResult<bool> {
        let removed = E::delete_many()
            .filter(E::source_column().eq(source))
            .filter(E::target_column().eq(target))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .rows_affected;

        if removed == 0 {
            return Ok(false);
        }

        if let Some(counter) = E::SOURCE_COUNTER {
            CounterLedger::decrement(conn, source, counter, removed as i64).await?;
        }
        if let Some(counter) = E::TARGET_COUNTER {
            CounterLedger::decrement(conn, target, counter, removed as i64).await?;
        }
        Ok(true)
    }

    /// Delete `source -> t` for every `t` in `targets`.
    ///
    /// Returns the removed rows. Each row is deleted by id, so concurrent callers
    /// never both count the same removal.
    pub async fn unlink_many<E: CountedEdge>(
        conn: &impl ConnectionTrait,
        source: i64,
        targets: &[i64],
    ) -> AppResult<Vec<E::Model>> {
        let candidates = Self::linked_targets::<E>(conn, source, targets).await?;
        let mut removed = Vec::with_capacity(candidates.len());

        for edge in candidates {
            let (_, target) = E::endpoints(&edge);
            if Self::unlink::<E>(conn, source, target).await? {
                removed.push(edge);
            }
        }

        Ok(removed)
    }

    /// One page of edges matching `condition`, newest first.
    pub async fn list_page<E: Edge>(
        conn: &impl ConnectionTrait,
        condition: Condition,
        request: &PageRequest,
    ) -> AppResult<Page<E::Model>> {
        let mut query = E::find()
            .filter(condition)
            .order_by_desc(E::id_column());

        if let Some(cursor) = request.cursor {
            query = query.filter(E::id_column().lt(cursor));
        }

        let rows = query
            .limit(request.fetch_limit())
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Page::from_overfetch(rows, request, E::edge_id))
    }

    /// Edges going out of `source`, newest first.
    pub async fn list_by_source<E: Edge>(
        conn: &impl ConnectionTrait,
        source: i64,
        request: &PageRequest,
    ) -> AppResult<Page<E::Model>> {
        Self::list_page::<E>(
            conn,
            Condition::all().add(E::source_column().eq(source)),
            request,
        )
        .await
    }

    /// Edges coming into `target`, newest first.
    pub async fn list_by_target<E: Edge>(
        conn: &impl ConnectionTrait,
        target: i64,
        request: &PageRequest,
    ) -> AppResult<Page<E::Model>> {
        Self::list_page::<E>(
            conn,
            Condition::all().add(E::target_column().eq(target)),
            request,
        )
        .await
    }
}

impl Edge for follow::Entity {
    fn id_column() -> Self::Column {
        follow::Column::Id
    }
    fn source_column() -> Self::Column {
        follow::Column::FollowerId
    }
    fn target_column() -> Self::Column {
        follow::Column::FollowingId
    }
    fn created_at_column() -> Self::Column {
        follow::Column::CreatedAt
    }
    fn edge_id(model: &follow::Model) -> i64 {
        model.id
    }
    fn endpoints(model: &follow::Model) -> (i64, i64) {
        (model.follower_id, model.following_id)
    }
}

impl CountedEdge for follow::Entity {
    const SOURCE_COUNTER: Option<Counter> = Some(Counter::Following);
    const TARGET_COUNTER: Option<Counter> = Some(Counter::Followers);
}

impl Edge for block::Entity {
    fn id_column() -> Self::Column {
        block::Column::Id
    }
    fn source_column() -> Self::Column {
        block::Column::BlockerId
    }
    fn target_column() -> Self::Column {
        block::Column::BlockedId
    }
    fn created_at_column() -> Self::Column {
        block::Column::CreatedAt
    }
    fn edge_id(model: &block::Model) -> i64 {
        model.id
    }
    fn endpoints(model: &block::Model) -> (i64, i64) {
        (model.blocker_id, model.blocked_id)
    }
}

impl CountedEdge for block::Entity {
    const SOURCE_COUNTER: Option<Counter> = Some(Counter::Blocked);
    const TARGET_COUNTER: Option<Counter> = None;
}

impl Edge for close_friend::Entity {
    fn id_column() -> Self::Column {
        close_friend::Column::Id
    }
    fn source_column() -> Self::Column {
        close_friend::Column::OwnerId
    }
    fn target_column() -> Self::Column {
        close_friend::Column::FriendId
    }
    fn created_at_column() -> Self::Column {
        close_friend::Column::CreatedAt
    }
    fn edge_id(model: &close_friend::Model) -> i64 {
        model.id
    }
    fn endpoints(model: &close_friend::Model) -> (i64, i64) {
        (model.owner_id, model.friend_id)
    }
}

impl CountedEdge for close_friend::Entity {
    const SOURCE_COUNTER: Option<Counter> = Some(Counter::CloseFriends);
    const TARGET_COUNTER: Option<Counter> = None;
}

// Requests carry a status and are written through `FollowRequestRepository`;
// they only borrow the lookup and listing half of the store.
impl Edge for follow_request::Entity {
    fn id_column() -> Self::Column {
        follow_request::Column::Id
    }
    fn source_column() -> Self::Column {
        follow_request::Column::RequesterId
    }
    fn target_column() -> Self::Column {
        follow_request::Column::TargetId
    }
    fn created_at_column() -> Self::Column {
        follow_request::Column::CreatedAt
    }
    fn edge_id(model: &follow_request::Model) -> i64 {
        model.id
    }
    fn endpoints(model: &follow_request::Model) -> (i64, i64) {
        (model.requester_id, model.target_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::{Block, Follow};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn follow_model(id: i64, follower_id: i64, following_id: i64) -> follow::Model {
        follow::Model {
            id,
            follower_id,
            following_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_pair_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[follow_model(1, 10, 20)]])
            .into_connection();

        let found = EdgeStore::find_pair::<Follow>(&db, 10, 20).await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(1));
    }

    #[tokio::test]
    async fn test_exists_between_checks_reverse_direction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<block::Model>::new()])
            .append_query_results([[block::Model {
                id: 3,
                blocker_id: 20,
                blocked_id: 10,
                created_at: Utc::now().into(),
            }]])
            .into_connection();

        assert!(EdgeStore::exists_between::<Block>(&db, 10, 20).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlink_absent_edge_leaves_counters() {
        // Only the DELETE is queued; a counter UPDATE would find no result.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(!EdgeStore::unlink::<Follow>(&db, 10, 20).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlink_decrements_both_sides() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        assert!(EdgeStore::unlink::<Follow>(&db, 10, 20).await.unwrap());

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_list_page_overfetches_by_one() {
        let rows = vec![
            follow_model(5, 1, 100),
            follow_model(4, 2, 100),
            follow_model(3, 3, 100),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let request = PageRequest::new(None, Some(2));
        let page = EdgeStore::list_by_target::<Follow>(&db, 100, &request)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor, Some(4));

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("LIMIT"));
        assert!(sql.contains("ORDER BY"));
    }

    #[test]
    fn test_link_outcome() {
        assert!(LinkOutcome::Created.is_created());
        assert!(!LinkOutcome::AlreadyExists.is_created());
    }
}
