use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A badge code the door knows about.
///
/// A key code opens the door only when it is enabled and some [`User`]
/// references it through `key_code_id`.
///
/// [`User`]: super::User
///
/// # Examples
///
/// ```
/// use latchkey_storage::models::KeyCode;
/// use chrono::Utc;
///
/// let key = KeyCode {
///     id: 1,
///     code: "12345".to_string(),
///     enabled: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// assert!(key.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeyCode {
    pub id: i64,

    /// Code as read from the badge (unique, at most 26 characters)
    pub code: String,

    /// Disabled codes are rejected even when linked to a user
    pub enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
