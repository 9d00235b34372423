use thiserror::Error;

/// Storage-specific error types for the Latchkey credential store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A unique value (email, key code) is already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Injected or otherwise unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn not_found(entity_type: &str, field: &str, value: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Turn a unique constraint violation into [`StorageError::Conflict`].
    ///
    /// Any other error passes through as [`StorageError::Database`].
    pub(crate) fn from_write(error: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(what()),
            _ => Self::Database(error),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let error = StorageError::not_found("KeyCode", "code", "12345");
        assert_eq!(error.to_string(), "Entity not found: KeyCode with code=12345");
    }

    #[test]
    fn test_non_unique_error_passes_through() {
        let error = StorageError::from_write(sqlx::Error::RowNotFound, || "unused".to_string());
        assert!(matches!(error, StorageError::Database(sqlx::Error::RowNotFound)));
    }
}
