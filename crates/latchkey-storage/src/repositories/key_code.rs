#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::KeyCode;
use latchkey_core::CredentialCode;
use latchkey_core::constants::MAX_CODE_LENGTH;
use sqlx::SqlitePool;
use tracing::info;

/// Repository trait for key code operations
///
/// Uses native async trait methods (Edition 2024), no `async-trait` needed.
pub trait KeyCodeRepository: Send + Sync {
    /// Find a key code by its badge value
    async fn find_by_code(&self, code: &CredentialCode) -> StorageResult<Option<KeyCode>>;

    /// Find a key code by its ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<KeyCode>>;

    /// Get all key codes, newest first
    async fn find_all(&self) -> StorageResult<Vec<KeyCode>>;

    /// Register a new key code
    async fn create(&self, code: &CredentialCode, enabled: bool) -> StorageResult<i64>;

    /// Enable or disable a key code
    async fn set_enabled(&self, code: &CredentialCode, enabled: bool) -> StorageResult<()>;

    /// Delete a key code; its user loses the assignment
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// Check if a badge value is already registered
    async fn exists_by_code(&self, code: &CredentialCode) -> StorageResult<bool>;
}

/// Reject codes that do not fit the `key_codes.code` column.
pub(crate) fn check_code_length(code: &CredentialCode) -> StorageResult<()> {
    let len = code.as_str().chars().count();
    if len > MAX_CODE_LENGTH {
        return Err(StorageError::Validation(format!(
            "key code is {} characters, the limit is {}",
            len, MAX_CODE_LENGTH
        )));
    }
    Ok(())
}

/// SQLite implementation of KeyCodeRepository
pub struct SqliteKeyCodeRepository {
    pool: SqlitePool,
}

impl SqliteKeyCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl KeyCodeRepository for SqliteKeyCodeRepository {
    async fn find_by_code(&self, code: &CredentialCode) -> StorageResult<Option<KeyCode>> {
        let key = sqlx::query_as::<_, KeyCode>(
            r#"
            SELECT id, code, enabled, created_at, updated_at
            FROM key_codes
            WHERE code = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<KeyCode>> {
        let key = sqlx::query_as::<_, KeyCode>(
            r#"
            SELECT id, code, enabled, created_at, updated_at
            FROM key_codes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    async fn find_all(&self) -> StorageResult<Vec<KeyCode>> {
        let keys = sqlx::query_as::<_, KeyCode>(
            r#"
            SELECT id, code, enabled, created_at, updated_at
            FROM key_codes
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn create(&self, code: &CredentialCode, enabled: bool) -> StorageResult<i64> {
        check_code_length(code)?;

        let result = sqlx::query("INSERT INTO key_codes (code, enabled) VALUES (?, ?)")
            .bind(code.as_str())
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                StorageError::from_write(e, || format!("key code {} already exists", code))
            })?;

        Ok(result.last_insert_rowid())
    }

    async fn set_enabled(&self, code: &CredentialCode, enabled: bool) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE key_codes
            SET enabled = ?, updated_at = datetime('now')
            WHERE code = ?
            "#,
        )
        .bind(enabled)
        .bind(code.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("KeyCode", "code", code));
        }

        info!(code = %code, enabled, "Key code updated");
        Ok(())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM key_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("KeyCode", "id", id));
        }

        Ok(())
    }

    async fn exists_by_code(&self, code: &CredentialCode) -> StorageResult<bool> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM key_codes WHERE code = ?")
            .bind(code.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }
}
