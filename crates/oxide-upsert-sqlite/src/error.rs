//! Error types for the SQLite executor.

use oxide_upsert::ExecutorError;

/// Errors raised while running a statement against SQLite.
#[derive(Debug, thiserror::Error)]
pub enum SqliteExecutorError {
    /// Database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The statement references a parameter that has no value.
    #[error("Missing bind parameter: {0}")]
    MissingBindParameter(String),

    /// A cursor was requested; only row collections are returned.
    #[error("Result set handles are not supported; query rows are always returned as a list")]
    ResultSetUnsupported,

    /// Auto-commit was switched off on a pooled executor.
    #[error("Auto-commit cannot be disabled on a pooled connection")]
    AutoCommitUnsupported,
}

impl From<SqliteExecutorError> for ExecutorError {
    fn from(error: SqliteExecutorError) -> Self {
        Self::from_source(error)
    }
}

/// Result type for SQLite executor operations.
pub type Result<T> = std::result::Result<T, SqliteExecutorError>;
