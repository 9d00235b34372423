//! Storage layer for the Latchkey door controller.
//!
//! SQLite-backed persistence for users and their key codes, plus the
//! [`CredentialStore`] seam the door consults on every badge.
//!
//! # Architecture
//!
//! - [`Database`]: connection pool with embedded migrations
//! - [`CredentialStore`]: the single lookup the door needs, with a SQLite
//!   implementation and an in-memory one for tests
//! - [`UserRepository`], [`KeyCodeRepository`]: admin-side data access
//! - [`transaction`]: multi-row writes such as enrolling a user with a badge
//!
//! # Schema
//!
//! ```text
//! key_codes(id, code UNIQUE, enabled DEFAULT 1)
//! users(id, first_name, last_name, email UNIQUE, key_code_id UNIQUE -> key_codes.id)
//! ```
//!
//! A key code opens the door when it exists, some user references it, and
//! it is enabled.
//!
//! # Example
//!
//! ```no_run
//! use latchkey_core::CredentialCode;
//! use latchkey_storage::{CredentialStore, Database, SqliteCredentialStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let store = SqliteCredentialStore::new(db.pool().clone());
//!
//! let record = store.lookup(&CredentialCode::new("12345")?).await?;
//! assert!(record.is_none());
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod credential;
pub mod error;
pub mod models;
pub mod repositories;
pub mod transaction;

pub use connection::{Database, DatabaseConfig};
pub use credential::{
    CredentialRecord, CredentialStore, MemoryCredentialStore, SqliteCredentialStore,
};
pub use error::{StorageError, StorageResult};
pub use models::{KeyCode, NewUser, User};
pub use repositories::{
    KeyCodeRepository, SqliteKeyCodeRepository, SqliteUserRepository, UserRepository,
};
pub use transaction::Enrollment;
