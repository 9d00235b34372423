//! Transaction-aware operations for atomic multistep writes.
//!
//! These functions take an open SQLite transaction so several writes can be
//! committed together. Dropping the transaction without committing rolls
//! everything back.
//!
//! ```no_run
//! use latchkey_core::CredentialCode;
//! use latchkey_storage::models::NewUser;
//! use latchkey_storage::{Database, DatabaseConfig, transaction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("database.db")).await?;
//!
//! let mut tx = db.pool().begin().await?;
//! let enrollment = transaction::enroll_user(
//!     &mut tx,
//!     &NewUser::new("Ada", "Lovelace", "ada@example.org"),
//!     &CredentialCode::new("12345")?,
//!     true,
//! )
//! .await?;
//! tx.commit().await?;
//!
//! println!("user {} holds key {}", enrollment.user_id, enrollment.key_code_id);
//! # Ok(())
//! # }
//! ```

use crate::error::{StorageError, StorageResult};
use crate::models::NewUser;
use crate::repositories::key_code::check_code_length;
use latchkey_core::CredentialCode;
use sqlx::{Sqlite, Transaction};
use tracing::info;

/// IDs created by [`enroll_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrollment {
    pub user_id: i64,
    pub key_code_id: i64,
}

/// Register a key code within a transaction.
///
/// # Errors
///
/// Returns [`StorageError::Conflict`] if the code already exists and
/// [`StorageError::Validation`] if it does not fit the schema.
pub async fn create_key_code(
    tx: &mut Transaction<'_, Sqlite>,
    code: &CredentialCode,
    enabled: bool,
) -> StorageResult<i64> {
    check_code_length(code)?;

    let result = sqlx::query("INSERT INTO key_codes (code, enabled) VALUES (?, ?)")
        .bind(code.as_str())
        .bind(enabled)
        .execute(&mut **tx)
        .await
        .map_err(|e| StorageError::from_write(e, || format!("key code {} already exists", code)))?;

    Ok(result.last_insert_rowid())
}

/// Create a user within a transaction.
///
/// # Errors
///
/// Returns [`StorageError::Conflict`] if the email is taken or the key code
/// is already assigned.
pub async fn create_user(
    tx: &mut Transaction<'_, Sqlite>,
    user: &NewUser,
    key_code_id: Option<i64>,
) -> StorageResult<i64> {
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
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        StorageError::from_write(e, || format!("email {} is already enrolled", user.email))
    })?;

    Ok(result.last_insert_rowid())
}

/// Create a key code and the user holding it in one step.
///
/// Nothing is written unless the caller commits `tx`.
///
/// # Errors
///
/// Returns [`StorageError::Conflict`] for a duplicate email or code, and
/// [`StorageError::Validation`] for unusable user fields or an oversized code.
pub async fn enroll_user(
    tx: &mut Transaction<'_, Sqlite>,
    user: &NewUser,
    code: &CredentialCode,
    enabled: bool,
) -> StorageResult<Enrollment> {
    let key_code_id = create_key_code(tx, code, enabled).await?;
    let user_id = create_user(tx, user, Some(key_code_id)).await?;

    info!(user_id, key_code_id, email = %user.email, "Enrolled user");
    Ok(Enrollment { user_id, key_code_id })
}

/// Enable or disable a key code within a transaction.
pub async fn set_key_code_enabled(
    tx: &mut Transaction<'_, Sqlite>,
    code: &CredentialCode,
    enabled: bool,
) -> StorageResult<()> {
    let result = sqlx::query(
        "UPDATE key_codes SET enabled = ?, updated_at = datetime('now') WHERE code = ?",
    )
    .bind(enabled)
    .bind(code.as_str())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("KeyCode", "code", code));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;

    fn code(s: &str) -> CredentialCode {
        CredentialCode::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_enroll_commits_both_rows() {
        let db = Database::in_memory().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let enrollment = enroll_user(
            &mut tx,
            &NewUser::new("Ada", "Lovelace", "ada@example.org"),
            &code("12345"),
            true,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let (key_code_id,): (Option<i64>,) =
            sqlx::query_as("SELECT key_code_id FROM users WHERE id = ?")
                .bind(enrollment.user_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(key_code_id, Some(enrollment.key_code_id));
    }

    #[tokio::test]
    async fn test_failed_enroll_leaves_nothing_behind() {
        let db = Database::in_memory().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        enroll_user(
            &mut tx,
            &NewUser::new("Ada", "Lovelace", "ada@example.org"),
            &code("111"),
            true,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // Same email, new code: the user insert fails after the key insert
        let mut tx = db.pool().begin().await.unwrap();
        let result = enroll_user(
            &mut tx,
            &NewUser::new("Ada", "Byron", "ada@example.org"),
            &code("222"),
            true,
        )
        .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        tx.rollback().await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM key_codes WHERE code = '222'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_set_key_code_enabled_missing() {
        let db = Database::in_memory().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let result = set_key_code_enabled(&mut tx, &code("404"), false).await;

        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }
}
