use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A person allowed through the door.
///
/// # Database Schema
///
/// Maps to the `users` table:
/// - `email` must be unique
/// - `key_code_id` references `key_codes(id)`, is unique, and is cleared
///   when the key code is deleted
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Badge assigned to this user, if any
    pub key_code_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if a badge is assigned.
    pub fn has_key_code(&self) -> bool {
        self.key_code_id.is_some()
    }
}

/// Fields needed to enroll a new user.
///
/// ```
/// use latchkey_storage::models::NewUser;
///
/// let user = NewUser::new("Ada", "Lovelace", "ada@example.org");
/// assert!(user.validate().is_ok());
///
/// let nameless = NewUser::new("", "Lovelace", "ada@example.org");
/// assert!(nameless.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Longest name or email the schema accepts.
pub const MAX_FIELD_LENGTH: usize = 255;

impl NewUser {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Reject blank, oversized, or obviously malformed fields before they
    /// reach the database.
    pub fn validate(&self) -> StorageResult<()> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Validation(format!("{} must not be empty", field)));
            }
            if value.chars().count() > MAX_FIELD_LENGTH {
                return Err(StorageError::Validation(format!(
                    "{} exceeds {} characters",
                    field, MAX_FIELD_LENGTH
                )));
            }
        }

        if !self.email.contains('@') {
            return Err(StorageError::Validation(format!(
                "email {:?} is not an address",
                self.email
            )));
        }

        Ok(())
    }
}
