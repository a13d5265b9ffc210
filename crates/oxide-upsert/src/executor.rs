//! The statement executor capability.
//!
//! An upsert never talks to a database directly. It drives a
//! [`StatementExecutor`], which runs one statement at a time and reports
//! either rows (for a query) or an affected-row count (for writes).

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::bind::NamedParams;
use crate::error::ExecutorError;
use crate::options::ExecutionOptions;
use crate::value::BindValue;

/// A boxed future for async executor operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A query row, keyed by column name.
pub type Row = BTreeMap<String, BindValue>;

/// Duplicate-key marker for Oracle (`ORA-00001: unique constraint violated`).
pub const ORACLE_DUPLICATE_KEY_MARKER: &str = "ORA-00001";

/// Outcome of an insert or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of rows the statement changed. Zero when the executor does not
    /// report a count.
    pub rows_affected: u64,
    /// Row id of the last inserted row, for executors that report one.
    pub last_insert_id: Option<i64>,
}

impl WriteResult {
    /// Creates a result with the given row count.
    #[must_use]
    pub const fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Sets the last inserted row id.
    #[must_use]
    pub const fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    /// Returns whether the statement changed at least one row.
    #[must_use]
    pub const fn has_effect(&self) -> bool {
        self.rows_affected > 0
    }
}

/// Runs individual statements against a database.
///
/// Parameters arrive already filtered down to the names the statement uses
/// (plus any LOB parameters registered in the options).
///
/// # Example
///
/// ```ignore
/// struct Recorder;
///
/// impl StatementExecutor for Recorder {
///     fn query<'a>(
///         &'a self,
///         sql: &'a str,
///         _params: NamedParams,
///         _options: &'a ExecutionOptions,
///     ) -> BoxFuture<'a, Result<Vec<Row>, ExecutorError>> {
///         Box::pin(async move {
///             println!("{sql}");
///             Ok(Vec::new())
///         })
///     }
///
///     // insert and update follow the same shape
/// }
/// ```
pub trait StatementExecutor: Send + Sync {
    /// Runs a query and returns the matched rows.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<Vec<Row>, ExecutorError>>;

    /// Runs an insert.
    fn insert<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>>;

    /// Runs an update.
    fn update<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>>;

    /// Substring of an insert error message that signals a duplicate key.
    fn duplicate_key_marker(&self) -> &str {
        ORACLE_DUPLICATE_KEY_MARKER
    }
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for Arc<E> {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<Vec<Row>, ExecutorError>> {
        (**self).query(sql, params, options)
    }

    fn insert<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        (**self).insert(sql, params, options)
    }

    fn update<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        (**self).update(sql, params, options)
    }

    fn duplicate_key_marker(&self) -> &str {
        (**self).duplicate_key_marker()
    }
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for &E {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<Vec<Row>, ExecutorError>> {
        (**self).query(sql, params, options)
    }

    fn insert<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        (**self).insert(sql, params, options)
    }

    fn update<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        (**self).update(sql, params, options)
    }

    fn duplicate_key_marker(&self) -> &str {
        (**self).duplicate_key_marker()
    }
}
