//! Storage error types.
//!
//! Uniqueness-constraint hits are not errors; see [`super::InsertOutcome`].

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached (pool timeout, I/O, closed pool).
    #[error("database connection error: {message}")]
    ConnectionError { message: String },

    /// A query failed for a reason other than a known constraint.
    #[error("database query error: {message}")]
    QueryError { message: String },

    /// A referenced row does not exist.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A stored value could not be converted into a record.
    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

impl StorageError {
    pub fn is_connection_error(&self) -> bool {
        matches!(self, StorageError::ConnectionError { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
