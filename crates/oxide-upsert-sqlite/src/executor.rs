//! Statement executor over an sqlx SQLite pool.

use futures::TryStreamExt;
use oxide_upsert::{
    BindValue, BoxFuture, ExecutionOptions, ExecutorError, NamedParams, Row, StatementExecutor,
    WriteResult,
};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::{debug, trace};

use crate::error::{Result, SqliteExecutorError};
use crate::named::number_named_params;

/// Substring of SQLite's unique and primary key violation messages.
pub const SQLITE_DUPLICATE_KEY_MARKER: &str = "UNIQUE constraint failed";

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Insert,
    Update,
}

/// Runs upsert statements against a SQLite pool.
///
/// Statements use `:name` placeholders; they are rewritten to numbered
/// placeholders before execution. Every statement runs in auto-commit mode.
///
/// # Example
///
/// ```rust,ignore
/// use oxide_upsert::Upsert;
/// use oxide_upsert_sqlite::SqliteExecutor;
/// use sqlx::sqlite::SqlitePoolOptions;
///
/// let pool = SqlitePoolOptions::new().connect("sqlite:db.sqlite3").await?;
/// let upsert = Upsert::new(SqliteExecutor::new(pool));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Creates an executor over the given pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a query and decodes up to `options.max_rows` rows (all rows when
    /// unset or zero).
    ///
    /// # Errors
    ///
    /// Returns an error if the options ask for a cursor or switch auto-commit
    /// off, if the statement references a parameter missing from `params`,
    /// or if SQLite rejects the statement.
    pub async fn fetch_rows(
        &self,
        sql: &str,
        params: &NamedParams,
        options: &ExecutionOptions,
    ) -> Result<Vec<Row>> {
        check_options(options)?;
        if options.result_set == Some(true) {
            return Err(SqliteExecutorError::ResultSetUnsupported);
        }

        let (sql, values) = prepare(sql, params)?;
        debug!(sql = %sql, params = values.len(), "Executing query");

        let limit = options
            .max_rows
            .filter(|&max| max > 0)
            .and_then(|max| usize::try_from(max).ok());

        let mut stream = bind_all(sqlx::query(&sql), values).fetch(&self.pool);
        let mut rows = Vec::new();
        while let Some(row) = stream.try_next().await? {
            rows.push(decode_row(&row)?);
            if limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
        }

        Ok(rows)
    }

    /// Runs an INSERT and reports the affected rows and the new row id.
    ///
    /// # Errors
    ///
    /// Returns an error if auto-commit is switched off, if a referenced
    /// parameter is missing, or if SQLite rejects the statement (a unique
    /// violation carries [`SQLITE_DUPLICATE_KEY_MARKER`]).
    pub async fn insert_row(
        &self,
        sql: &str,
        params: &NamedParams,
        options: &ExecutionOptions,
    ) -> Result<WriteResult> {
        self.write(WriteKind::Insert, sql, params, options).await
    }

    /// Runs an UPDATE and reports the affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if auto-commit is switched off, if a referenced
    /// parameter is missing, or if SQLite rejects the statement.
    pub async fn update_rows(
        &self,
        sql: &str,
        params: &NamedParams,
        options: &ExecutionOptions,
    ) -> Result<WriteResult> {
        self.write(WriteKind::Update, sql, params, options).await
    }

    async fn write(
        &self,
        kind: WriteKind,
        sql: &str,
        params: &NamedParams,
        options: &ExecutionOptions,
    ) -> Result<WriteResult> {
        check_options(options)?;

        let (sql, values) = prepare(sql, params)?;
        debug!(sql = %sql, params = values.len(), ?kind, "Executing write");

        let done = bind_all(sqlx::query(&sql), values)
            .execute(&self.pool)
            .await?;

        let result = WriteResult::new(done.rows_affected());
        Ok(match kind {
            WriteKind::Insert => result.with_last_insert_id(done.last_insert_rowid()),
            WriteKind::Update => result,
        })
    }
}

impl StatementExecutor for SqliteExecutor {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, std::result::Result<Vec<Row>, ExecutorError>> {
        Box::pin(async move { Ok(self.fetch_rows(sql, &params, options).await?) })
    }

    fn insert<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, std::result::Result<WriteResult, ExecutorError>> {
        Box::pin(async move { Ok(self.insert_row(sql, &params, options).await?) })
    }

    fn update<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, std::result::Result<WriteResult, ExecutorError>> {
        Box::pin(async move { Ok(self.update_rows(sql, &params, options).await?) })
    }

    fn duplicate_key_marker(&self) -> &str {
        SQLITE_DUPLICATE_KEY_MARKER
    }
}

fn check_options(options: &ExecutionOptions) -> Result<()> {
    if options.auto_commit == Some(false) {
        return Err(SqliteExecutorError::AutoCommitUnsupported);
    }
    Ok(())
}

/// Rewrites the statement to numbered placeholders and collects the values
/// in binding order.
fn prepare(sql: &str, params: &NamedParams) -> Result<(String, Vec<BindValue>)> {
    let numbered = number_named_params(sql);

    let values = numbered
        .names
        .iter()
        .map(|name| {
            params
                .get(name)
                .cloned()
                .ok_or_else(|| SqliteExecutorError::MissingBindParameter(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    for (position, (name, value)) in numbered.names.iter().zip(&values).enumerate() {
        trace!(
            param = %name,
            position = position + 1,
            kind = value.type_name(),
            "Binding parameter"
        );
    }
    for name in params.keys().filter(|name| !numbered.names.contains(name)) {
        trace!(param = %name, "Bind parameter not referenced by statement");
    }

    Ok((numbered.sql, values))
}

fn bind_all(query: SqliteQuery<'_>, values: Vec<BindValue>) -> SqliteQuery<'_> {
    values.into_iter().fold(query, bind_value)
}

/// Binds one value to the next numbered placeholder.
fn bind_value(query: SqliteQuery<'_>, value: BindValue) -> SqliteQuery<'_> {
    match value {
        BindValue::Null => query.bind(Option::<i64>::None),
        BindValue::Bool(b) => query.bind(b),
        BindValue::Int(i) => query.bind(i),
        BindValue::Float(f) => query.bind(f),
        BindValue::Text(s) => query.bind(s),
        BindValue::Blob(b) => query.bind(b),
    }
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::new();

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            BindValue::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" => BindValue::Int(row.try_get(index)?),
                "REAL" => BindValue::Float(row.try_get(index)?),
                "BOOLEAN" => BindValue::Bool(row.try_get(index)?),
                "BLOB" => BindValue::Blob(row.try_get(index)?),
                _ => BindValue::Text(row.try_get(index)?),
            }
        };

        decoded.insert(column.name().to_string(), value);
    }

    Ok(decoded)
}
