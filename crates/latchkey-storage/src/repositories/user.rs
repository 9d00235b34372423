#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{NewUser, User};
use sqlx::SqlitePool;

/// Repository trait for User entity operations
///
/// Uses native async trait methods (Edition 2024), no `async-trait` needed.
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>>;

    /// Find a user by their email address
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Find the user a key code is assigned to
    async fn find_by_key_code_id(&self, key_code_id: i64) -> StorageResult<Option<User>>;

    /// Get all users ordered by last name
    async fn find_all(&self) -> StorageResult<Vec<User>>;

    /// Create a new user, optionally with a key code
    async fn create(&self, user: &NewUser, key_code_id: Option<i64>) -> StorageResult<i64>;

    /// Assign or clear a user's key code
    async fn assign_key_code(&self, user_id: i64, key_code_id: Option<i64>) -> StorageResult<()>;

    /// Delete a user by ID
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

/// SQLite implementation of UserRepository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, key_code_id, created_at, updated_at";

impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_key_code_id(&self, key_code_id: i64) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE key_code_id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(key_code_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_all(&self) -> StorageResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY last_name, first_name",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;

        Ok(users)
    }

    async fn create(&self, user: &NewUser, key_code_id: Option<i64>) -> StorageResult<i64> {
        user.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, key_code_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(key_code_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StorageError::from_write(e, || {
                format!("email {} or its key code is already in use", user.email)
            })
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn assign_key_code(&self, user_id: i64, key_code_id: Option<i64>) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET key_code_id = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(key_code_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StorageError::from_write(e, || {
                "key code is already assigned to another user".to_string()
            })
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", "id", user_id));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", "id", id));
        }

        Ok(())
    }
}
