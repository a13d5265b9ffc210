//! Calling conventions for an upsert.
//!
//! Every convention runs the same [`Upsert::upsert`] and yields the same
//! `Result`; only the delivery differs:
//!
//! - [`UpsertCall::execute`] - await the result directly.
//! - [`UpsertCall::on_done`] - run in the background, hand the result to a
//!   callback.
//! - [`UpsertCall::deferred`] - run in the background, await a [`Deferred`]
//!   handle later.
//!
//! The background conventions spawn onto the current tokio runtime and panic
//! when called outside one.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::bind::BindParams;
use crate::error::{Result, UpsertError};
use crate::executor::{StatementExecutor, WriteResult};
use crate::options::{ExecutionOptions, SqlTriple};
use crate::upsert::Upsert;

/// A prepared upsert call.
///
/// # Example
///
/// ```rust,ignore
/// // Callback style
/// upsert
///     .call(sqls.clone(), params.clone())
///     .options(ExecutionOptions::new().auto_commit(false))
///     .on_done(|outcome| match outcome {
///         Ok(result) => println!("rows affected: {}", result.rows_affected),
///         Err(error) => eprintln!("upsert failed: {error}"),
///     });
///
/// // Deferred style
/// let pending = upsert.call(sqls, params).deferred();
/// let result = pending.await?;
/// ```
#[derive(Debug)]
#[must_use = "an upsert call does nothing until executed, deferred or given a callback"]
pub struct UpsertCall<E: ?Sized> {
    upsert: Upsert<E>,
    sqls: SqlTriple,
    params: BindParams,
    options: Option<ExecutionOptions>,
}

impl<E: StatementExecutor + ?Sized> UpsertCall<E> {
    pub(crate) const fn new(upsert: Upsert<E>, sqls: SqlTriple, params: BindParams) -> Self {
        Self {
            upsert,
            sqls,
            params,
            options: None,
        }
    }

    /// Sets the execution options.
    pub fn options(mut self, options: ExecutionOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Runs the upsert and returns its result.
    ///
    /// # Errors
    ///
    /// See [`Upsert::upsert`].
    pub async fn execute(self) -> Result<WriteResult> {
        self.upsert
            .upsert(&self.sqls, self.params, self.options.as_ref())
            .await
    }
}

impl<E: StatementExecutor + ?Sized + 'static> UpsertCall<E> {
    /// Runs the upsert in the background and passes the result to `callback`.
    ///
    /// The callback runs exactly once unless the runtime shuts down first.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn on_done<F>(self, callback: F)
    where
        F: FnOnce(Result<WriteResult>) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.execute().await);
        });
    }

    /// Starts the upsert in the background and returns a handle resolving to
    /// its result.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn deferred(self) -> Deferred {
        Deferred {
            handle: tokio::spawn(self.execute()),
        }
    }
}

/// A started upsert whose result is awaited later.
///
/// Dropping the handle does not stop the upsert.
#[derive(Debug)]
#[must_use = "a deferred upsert result is lost unless awaited"]
pub struct Deferred {
    handle: JoinHandle<Result<WriteResult>>,
}

impl Deferred {
    /// Returns whether the upsert has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for Deferred {
    type Output = Result<WriteResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(error)) if error.is_panic() => {
                std::panic::resume_unwind(error.into_panic())
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(UpsertError::Interrupted)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{Op, ScriptedExecutor};
    use tokio::sync::oneshot;

    fn sqls() -> SqlTriple {
        SqlTriple::new(
            "SELECT ID FROM MY_DATA WHERE ID = :id",
            "INSERT INTO MY_DATA (ID, NAME) VALUES (:id, :name)",
            "UPDATE MY_DATA SET NAME = :name WHERE ID = :id",
        )
    }

    fn params() -> BindParams {
        BindParams::new().bind("id", 110).bind("name", "new name")
    }

    #[tokio::test]
    async fn test_execute() {
        let upsert = Upsert::new(ScriptedExecutor::new().rows(1).updated(1));

        let result = upsert
            .call(sqls(), params())
            .options(ExecutionOptions::new().auto_commit(true))
            .execute()
            .await
            .unwrap();

        assert_eq!(result.rows_affected, 1);
        let calls = upsert.executor().calls();
        assert_eq!(calls[1].options.auto_commit, Some(true));
    }

    #[tokio::test]
    async fn test_callback_receives_result() {
        let upsert = Upsert::new(ScriptedExecutor::new().rows(0).inserted(1));
        let (tx, rx) = oneshot::channel();

        upsert.call(sqls(), params()).on_done(move |outcome| {
            let _ = tx.send(outcome);
        });

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result, WriteResult::new(1));
        assert_eq!(upsert.executor().count(Op::Update), 0);
    }

    #[tokio::test]
    async fn test_callback_receives_error() {
        let upsert = Upsert::new(ScriptedExecutor::new().rows(1).updated(0));
        let (tx, rx) = oneshot::channel();

        upsert.call(sqls(), params()).on_done(move |outcome| {
            let _ = tx.send(outcome);
        });

        let error = rx.await.unwrap().unwrap_err();
        assert_eq!(error.to_string(), "No rows updated.");
    }

    #[tokio::test]
    async fn test_callback_invalid_input() {
        let upsert = Upsert::new(ScriptedExecutor::new());
        let (tx, rx) = oneshot::channel();

        upsert
            .call(sqls(), BindParams::Positional(vec![]))
            .on_done(move |outcome| {
                let _ = tx.send(outcome);
            });

        assert_eq!(rx.await.unwrap().unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(upsert.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_deferred_resolves() {
        let upsert = Upsert::new(
            ScriptedExecutor::new()
                .rows(0)
                .insert_error("test ORA-00001 error")
                .updated(1),
        );

        let pending = upsert.call(sqls(), params()).deferred();
        let result = pending.await.unwrap();

        assert_eq!(result, WriteResult::new(1));
        assert_eq!(upsert.executor().count(Op::Insert), 1);
        assert_eq!(upsert.executor().count(Op::Update), 1);
    }

    #[tokio::test]
    async fn test_deferred_rejects() {
        let upsert = Upsert::new(ScriptedExecutor::new().query_error("test query error"));

        let error = upsert.call(sqls(), params()).deferred().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ProbeFailure);
        assert_eq!(error.to_string(), "test query error");
    }

    #[test]
    #[should_panic(expected = "no reactor running")]
    fn test_deferred_outside_runtime_panics() {
        let upsert = Upsert::new(ScriptedExecutor::new());
        let _pending = upsert.call(sqls(), params()).deferred();
    }

    #[test]
    #[should_panic(expected = "no reactor running")]
    fn test_callback_outside_runtime_panics() {
        let upsert = Upsert::new(ScriptedExecutor::new());
        upsert.call(sqls(), params()).on_done(|_| {});
    }

    #[tokio::test]
    async fn test_deferred_matches_execute() {
        let direct = Upsert::new(ScriptedExecutor::new().rows(1).updated(3));
        let deferred = Upsert::new(ScriptedExecutor::new().rows(1).updated(3));

        let a = direct.call(sqls(), params()).execute().await.unwrap();
        let b = deferred.call(sqls(), params()).deferred().await.unwrap();
        assert_eq!(a, b);
    }
}
