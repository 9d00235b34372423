//! Credential lookup used by the door at badge time.
//!
//! The door asks one question per badge: does this code exist, is anyone
//! assigned to it, and is it enabled. [`CredentialStore`] answers it in a
//! single call so a concurrent admin write can never be seen half-applied.
#![allow(async_fn_in_trait)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use latchkey_core::CredentialCode;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// What the store knows about one key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Some user is assigned this code
    pub identity_present: bool,

    /// The code has not been disabled
    pub enabled: bool,
}

impl CredentialRecord {
    /// A code assigned to a user.
    pub fn linked(enabled: bool) -> Self {
        Self {
            identity_present: true,
            enabled,
        }
    }

    /// A code no user is assigned to.
    pub fn unlinked(enabled: bool) -> Self {
        Self {
            identity_present: false,
            enabled,
        }
    }
}

/// Read access to registered key codes.
pub trait CredentialStore: Send + Sync {
    /// Look up one code. `Ok(None)` means the code is not registered.
    async fn lookup(&self, code: &CredentialCode) -> StorageResult<Option<CredentialRecord>>;
}

/// [`CredentialStore`] over the SQLite schema.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn lookup(&self, code: &CredentialCode) -> StorageResult<Option<CredentialRecord>> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT k.enabled, COUNT(u.id)
            FROM key_codes k
            LEFT JOIN users u ON u.key_code_id = k.id
            WHERE k.code = ?
            GROUP BY k.id
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let record = row.map(|(enabled, users)| CredentialRecord {
            identity_present: users > 0,
            enabled: enabled != 0,
        });
        debug!(code = %code, ?record, "Credential lookup");
        Ok(record)
    }
}

/// In-memory [`CredentialStore`] for tests and dry runs.
///
/// Clones share the same records, so a test can keep one clone to edit
/// records while the door holds another.
///
/// ```
/// use latchkey_core::CredentialCode;
/// use latchkey_storage::{CredentialRecord, CredentialStore, MemoryCredentialStore};
///
/// # async fn example() {
/// let store = MemoryCredentialStore::new();
/// store.insert("12345", CredentialRecord::linked(true));
///
/// let code = CredentialCode::new("12345").unwrap();
/// assert_eq!(store.lookup(&code).await.unwrap(), Some(CredentialRecord::linked(true)));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    records: Arc<Mutex<HashMap<String, CredentialRecord>>>,
    failing: Arc<AtomicBool>,
    lookups: Arc<AtomicUsize>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the record for `code`.
    pub fn insert(&self, code: impl Into<String>, record: CredentialRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.into(), record);
    }

    pub fn remove(&self, code: &str) -> Option<CredentialRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code)
    }

    /// Make every later lookup fail (or succeed again).
    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn lookup(&self, code: &CredentialCode) -> StorageResult<Option<CredentialRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("injected lookup failure".to_string()));
        }

        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(code.as_str()).copied())
    }
}
