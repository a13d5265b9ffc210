//! The upsert orchestrator.
//!
//! An upsert runs three caller-supplied statements against a
//! [`StatementExecutor`]:
//!
//! 1. **Probe** - query for the target row (capped at one row).
//! 2. **Insert** - only when the probe found nothing.
//! 3. **Update** - when the probe found a row, the insert hit a duplicate key,
//!    or the insert changed no rows.
//!
//! The steps run as an explicit state machine:
//!
//! ```text
//! Start -> Probing -> RunInsert ---------> Done
//!                 \             \
//!                  \             v
//!                   SkipToUpdateCheck -> RunUpdate -> Done
//!                                                 \-> Failed
//! ```
//!
//! Any executor error other than a duplicate key on insert goes straight to
//! `Failed` and is returned unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bind::{filter_bind_params, BindParams, NamedParams};
use crate::call::UpsertCall;
use crate::error::{Result, UpsertError};
use crate::executor::{StatementExecutor, WriteResult};
use crate::options::{ExecutionOptions, SqlTriple};

/// Why an upsert took the update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The probe found the target row.
    RowExists,
    /// The insert failed on a duplicate key (a concurrent writer won the race).
    DuplicateKey,
    /// The insert succeeded but changed no rows.
    InsertNoEffect,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RowExists => "row exists",
            Self::DuplicateKey => "duplicate key on insert",
            Self::InsertNoEffect => "insert changed no rows",
        })
    }
}

/// States of a single upsert.
#[derive(Debug)]
enum State {
    Start(BindParams),
    Probing,
    RunInsert,
    SkipToUpdateCheck,
    RunUpdate(Fallback),
    Done(WriteResult),
    Failed(UpsertError),
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Probing => "probing",
            Self::RunInsert => "run_insert",
            Self::SkipToUpdateCheck => "skip_to_update_check",
            Self::RunUpdate(_) => "run_update",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// Conditional insert-or-update over a [`StatementExecutor`].
///
/// The executor is shared behind an [`Arc`]; cloning an `Upsert` is cheap and
/// every call keeps its own state, so one instance can serve any number of
/// concurrent upserts.
///
/// # Example
///
/// ```rust,ignore
/// use oxide_upsert::{BindParams, ExecutionOptions, SqlTriple, Upsert};
///
/// let upsert = Upsert::new(executor);
///
/// let result = upsert
///     .upsert(
///         &SqlTriple::new(
///             "SELECT ID FROM MY_DATA WHERE ID = :id",
///             "INSERT INTO MY_DATA (ID, NAME) VALUES (:id, :name)",
///             "UPDATE MY_DATA SET NAME = :name WHERE ID = :id",
///         ),
///         BindParams::new().bind("id", 110).bind("name", "new name"),
///         Some(&ExecutionOptions::new().auto_commit(false)),
///     )
///     .await?;
///
/// println!("rows affected: {}", result.rows_affected);
/// ```
pub struct Upsert<E: ?Sized> {
    duplicate_key_marker: Option<String>,
    executor: Arc<E>,
}

impl<E: ?Sized> Clone for Upsert<E> {
    fn clone(&self) -> Self {
        Self {
            duplicate_key_marker: self.duplicate_key_marker.clone(),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: ?Sized> fmt::Debug for Upsert<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upsert")
            .field("duplicate_key_marker", &self.duplicate_key_marker)
            .finish_non_exhaustive()
    }
}

impl<E: StatementExecutor> Upsert<E> {
    /// Creates an upsert over the given executor.
    pub fn new(executor: E) -> Self {
        Self::from_arc(Arc::new(executor))
    }
}

impl<E: StatementExecutor + ?Sized> Upsert<E> {
    /// Creates an upsert over an already shared executor.
    pub const fn from_arc(executor: Arc<E>) -> Self {
        Self {
            duplicate_key_marker: None,
            executor,
        }
    }

    /// Overrides the executor's duplicate-key marker.
    #[must_use]
    pub fn with_duplicate_key_marker(mut self, marker: impl Into<String>) -> Self {
        self.duplicate_key_marker = Some(marker.into());
        self
    }

    /// Returns the executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the substring that marks an insert error as a duplicate key.
    #[must_use]
    pub fn duplicate_key_marker(&self) -> &str {
        self.duplicate_key_marker
            .as_deref()
            .unwrap_or_else(|| self.executor.duplicate_key_marker())
    }

    /// Starts a call that can be awaited, handed a callback, or deferred.
    pub fn call(&self, sqls: SqlTriple, params: impl Into<BindParams>) -> UpsertCall<E> {
        UpsertCall::new(self.clone(), sqls, params.into())
    }

    /// Runs the upsert and returns the result of whichever write changed the
    /// row.
    ///
    /// `None` options behave as empty options. The probe runs with a copy
    /// capped at one row; the caller's options are passed to the writes
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`UpsertError::InvalidInput`] for positional bind params (no
    ///   statement is run).
    /// - [`UpsertError::Probe`], [`UpsertError::Insert`] or
    ///   [`UpsertError::Update`] with the executor error unchanged.
    /// - [`UpsertError::NoRowsUpdated`] when the update matched nothing.
    pub async fn upsert(
        &self,
        sqls: &SqlTriple,
        params: BindParams,
        options: Option<&ExecutionOptions>,
    ) -> Result<WriteResult> {
        let defaults = ExecutionOptions::default();
        let mut run = Run {
            executor: &*self.executor,
            marker: self.duplicate_key_marker(),
            sqls,
            options: options.unwrap_or(&defaults),
            params: NamedParams::new(),
        };

        let mut state = State::Start(params);
        loop {
            state = match state {
                State::Done(result) => return Ok(result),
                State::Failed(error) => {
                    debug!(kind = ?error.kind(), error = %error, "Upsert failed");
                    return Err(error);
                }
                state => {
                    let from = state.name();
                    let next = run.step(state).await;
                    debug!(from, to = next.name(), "Upsert transition");
                    next
                }
            };
        }
    }
}

/// Per-call state. Nothing here outlives one upsert.
struct Run<'a, E: ?Sized> {
    executor: &'a E,
    marker: &'a str,
    sqls: &'a SqlTriple,
    options: &'a ExecutionOptions,
    params: NamedParams,
}

impl<E: StatementExecutor + ?Sized> Run<'_, E> {
    async fn step(&mut self, state: State) -> State {
        match state {
            State::Start(params) => self.start(params),
            State::Probing => self.probe().await,
            State::RunInsert => self.insert().await,
            State::SkipToUpdateCheck => State::RunUpdate(Fallback::RowExists),
            State::RunUpdate(reason) => self.update(reason).await,
            terminal @ (State::Done(_) | State::Failed(_)) => terminal,
        }
    }

    fn start(&mut self, params: BindParams) -> State {
        match params {
            BindParams::Named(params) => {
                self.params = params;
                State::Probing
            }
            BindParams::Positional(_) => State::Failed(UpsertError::positional_params()),
        }
    }

    async fn probe(&self) -> State {
        let sql = &self.sqls.query;
        let options = self.options.for_probe();
        let params = filter_bind_params(sql, &self.params, None);

        debug!(sql = %sql, params = params.len(), "Probing for existing row");
        match self.executor.query(sql, params, &options).await {
            Err(error) => State::Failed(UpsertError::Probe(error)),
            Ok(rows) if rows.is_empty() => State::RunInsert,
            Ok(_) => State::SkipToUpdateCheck,
        }
    }

    async fn insert(&self) -> State {
        let sql = &self.sqls.insert;
        let params = filter_bind_params(sql, &self.params, self.options.lob_meta_info.as_ref());

        debug!(sql = %sql, params = params.len(), "Inserting row");
        match self.executor.insert(sql, params, self.options).await {
            Err(error) if error.contains(self.marker) => {
                debug!(error = %error, "Insert hit a duplicate key, falling back to update");
                State::RunUpdate(Fallback::DuplicateKey)
            }
            Err(error) => State::Failed(UpsertError::Insert(error)),
            Ok(result) if result.has_effect() => {
                info!(rows_affected = result.rows_affected, "Upsert inserted row");
                State::Done(result)
            }
            Ok(_) => {
                debug!("Insert changed no rows, falling back to update");
                State::RunUpdate(Fallback::InsertNoEffect)
            }
        }
    }

    async fn update(&self, reason: Fallback) -> State {
        let sql = &self.sqls.update;
        let params = filter_bind_params(sql, &self.params, self.options.lob_meta_info.as_ref());

        debug!(sql = %sql, params = params.len(), %reason, "Updating row");
        match self.executor.update(sql, params, self.options).await {
            Err(error) => State::Failed(UpsertError::Update(error)),
            Ok(result) if result.has_effect() => {
                info!(rows_affected = result.rows_affected, %reason, "Upsert updated row");
                State::Done(result)
            }
            Ok(_) => State::Failed(UpsertError::NoRowsUpdated),
        }
    }
}
