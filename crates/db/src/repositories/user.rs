//! User repository for database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use ironbank_shared::AppError;

use crate::entities::{accounts, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserRepoError {
    /// The username is already registered.
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserRepoError> for AppError {
    fn from(err: UserRepoError) -> Self {
        match err {
            UserRepoError::UsernameTaken(username) => {
                Self::Conflict(format!("Username already taken: {username}"))
            }
            UserRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if a username is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user together with their zero-balance account.
    ///
    /// Both inserts share one database transaction: either both rows exist
    /// afterwards or neither does, so a failed registration never leaves an
    /// orphan user that would block a retry with the same username.
    ///
    /// # Errors
    ///
    /// Returns `UserRepoError::UsernameTaken` if the username is already
    /// registered, or `UserRepoError::Database` if the insert fails.
    pub async fn create_with_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(users::Model, accounts::Model), UserRepoError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().into();

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                UserRepoError::UsernameTaken(username.to_string())
            } else {
                UserRepoError::Database(e)
            }
        })?;

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok((user, account))
    }
}

/// Returns true if the error is a unique-constraint violation.
///
/// Falls back to message inspection because not every backend surfaces a
/// structured `SqlErr`.
fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    err.to_string().contains("duplicate key")
}
