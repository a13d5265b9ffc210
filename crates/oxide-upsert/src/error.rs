//! Error types for the upsert.

use std::error::Error as StdError;
use std::fmt;

/// An error reported by a statement executor.
///
/// The message is what the upsert inspects for the duplicate-key marker; the
/// source, when present, keeps the driver error for callers that need it.
#[derive(Debug)]
pub struct ExecutorError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExecutorError {
    /// Creates an executor error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an executor error wrapping a driver error. The message is the
    /// driver error's display text.
    pub fn from_source(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether the message contains `marker`.
    #[must_use]
    pub fn contains(&self, marker: &str) -> bool {
        !marker.is_empty() && self.message.contains(marker)
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ExecutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

/// Errors surfaced by an upsert.
///
/// Executor failures keep the executor's message verbatim. The only error the
/// upsert produces itself is [`UpsertError::NoRowsUpdated`].
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// Bind parameters were not a named mapping.
    #[error("{0}")]
    InvalidInput(String),

    /// The existence probe failed.
    #[error(transparent)]
    Probe(ExecutorError),

    /// The insert failed for a reason other than a duplicate key.
    #[error(transparent)]
    Insert(ExecutorError),

    /// The update failed.
    #[error(transparent)]
    Update(ExecutorError),

    /// The update ran but matched no rows.
    #[error("No rows updated.")]
    NoRowsUpdated,

    /// The task running the upsert was cancelled before it finished.
    #[error("Upsert interrupted before completion.")]
    Interrupted,
}

/// Classification of an [`UpsertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Positional or malformed bind parameters.
    InvalidInput,
    /// The probe query failed.
    ProbeFailure,
    /// The insert failed.
    InsertFailure,
    /// The update failed.
    UpdateFailure,
    /// The update affected no rows.
    UpdateNoEffect,
    /// The upsert task was cancelled.
    Interrupted,
}

impl UpsertError {
    /// The error for positional bind parameters.
    pub(crate) fn positional_params() -> Self {
        Self::InvalidInput("Array type bind params are not supported.".to_string())
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Probe(_) => ErrorKind::ProbeFailure,
            Self::Insert(_) => ErrorKind::InsertFailure,
            Self::Update(_) => ErrorKind::UpdateFailure,
            Self::NoRowsUpdated => ErrorKind::UpdateNoEffect,
            Self::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Returns the executor error behind a probe, insert or update failure.
    #[must_use]
    pub const fn executor_error(&self) -> Option<&ExecutorError> {
        match self {
            Self::Probe(e) | Self::Insert(e) | Self::Update(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for upsert operations.
pub type Result<T> = std::result::Result<T, UpsertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_messages_are_verbatim() {
        let error = UpsertError::Insert(ExecutorError::new("test insert error"));
        assert_eq!(error.to_string(), "test insert error");
        assert_eq!(error.kind(), ErrorKind::InsertFailure);
        assert_eq!(
            error.executor_error().map(ExecutorError::message),
            Some("test insert error")
        );
    }

    #[test]
    fn test_no_rows_updated_message() {
        assert_eq!(UpsertError::NoRowsUpdated.to_string(), "No rows updated.");
        assert!(UpsertError::NoRowsUpdated.executor_error().is_none());
    }

    #[test]
    fn test_positional_params_message() {
        let error = UpsertError::positional_params();
        assert_eq!(error.to_string(), "Array type bind params are not supported.");
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_from_source_keeps_driver_error() {
        let io = std::io::Error::other("disk gone");
        let error = ExecutorError::from_source(io);
        assert_eq!(error.message(), "disk gone");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_contains_marker() {
        let error = ExecutorError::new("ORA-00001: unique constraint (X.PK) violated");
        assert!(error.contains("ORA-00001"));
        assert!(!error.contains("ORA-01400"));
        assert!(!error.contains(""));
    }
}
