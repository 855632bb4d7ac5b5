//! User repository.
//!
//! The user row belongs to the identity subsystem. This repository covers the
//! reads the graph engine needs (existence, privacy flag, token lookup) plus the
//! pair lock taken at the start of every pair-mutating transaction.

use std::sync::Arc;

use crate::entities::{User, user};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sociograph_common::{AppError, AppResult};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user with zeroed counters.
    pub async fn create(
        &self,
        username: &str,
        token: Option<&str>,
        is_private: bool,
    ) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            token: Set(token.map(ToString::to_string)),
            is_private: Set(is_private),
            followers_count: Set(0),
            following_count: Set(0),
            blocked_count: Set(0),
            close_friends_count: Set(0),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Lock the rows of `ids`, lowest id first.
    ///
    /// Transactions touching the same users queue up here. Ids without a row are
    /// simply absent from the result.
    pub async fn lock_users(
        conn: &impl ConnectionTrait,
        ids: &[i64],
    ) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(user::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Lock both user rows of a pair.
    ///
    /// Returns the two rows as `(a, b)`; a missing row is reported as
    /// [`AppError::UserNotFound`].
    pub async fn lock_pair(
        conn: &impl ConnectionTrait,
        a: i64,
        b: i64,
    ) -> AppResult<(user::Model, user::Model)> {
        let rows = Self::lock_users(conn, &[a, b]).await?;

        let pick = |id: i64| {
            rows.iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(AppError::UserNotFound(id))
        };

        Ok((pick(a)?, pick(b)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            token: Some(format!("token-{id}")),
            is_private: false,
            followers_count: 0,
            following_count: 0,
            blocked_count: 0,
            close_friends_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(1, "alice")]])
            .into_connection();

        let repo = UserRepository::new(Arc::new(db));
        let result = repo.find_by_id(1).await.unwrap();

        assert_eq!(result.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let repo = UserRepository::new(Arc::new(db));
        let result = repo.get_by_id(9).await;

        assert!(matches!(result, Err(AppError::UserNotFound(9))));
    }

    #[tokio::test]
    async fn test_lock_pair_orders_by_argument() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(1, "alice"), create_test_user(2, "bob")]])
            .into_connection();

        let (a, b) = UserRepository::lock_pair(&db, 2, 1).await.unwrap();
        assert_eq!(a.username, "bob");
        assert_eq!(b.username, "alice");

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_lock_pair_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(1, "alice")]])
            .into_connection();

        let result = UserRepository::lock_pair(&db, 1, 5).await;
        assert!(matches!(result, Err(AppError::UserNotFound(5))));
    }
}
