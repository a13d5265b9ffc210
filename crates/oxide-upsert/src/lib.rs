//! # oxide-upsert
//!
//! Conditional insert-or-update for databases that only offer query, insert
//! and update primitives.
//!
//! An upsert takes three statements written by the caller (a probe, an
//! insert and an update), one set of named bind parameters, and runs:
//!
//! - the probe, capped at one row;
//! - the insert, if the probe found nothing;
//! - the update, if the probe found a row, the insert failed on a duplicate
//!   key, or the insert changed no rows.
//!
//! The result is the [`WriteResult`] of whichever write changed the row, or a
//! single [`UpsertError`].
//!
//! Each statement only receives the parameters it references (`:name`), plus
//! any LOB parameters registered in [`ExecutionOptions::lob_meta_info`]. See
//! [`filter_bind_params`].
//!
//! The database is reached through a [`StatementExecutor`], passed in when
//! the [`Upsert`] is created. The duplicate-key check is a substring match on
//! the executor's error message; the marker comes from
//! [`StatementExecutor::duplicate_key_marker`] (Oracle's `ORA-00001` by
//! default) or [`Upsert::with_duplicate_key_marker`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use oxide_upsert::{BindParams, ExecutionOptions, SqlTriple, Upsert};
//!
//! let upsert = Upsert::new(executor);
//! let sqls = SqlTriple::new(
//!     "SELECT ID FROM MY_DATA WHERE ID = :id",
//!     "INSERT INTO MY_DATA (ID, NAME) VALUES (:id, :name)",
//!     "UPDATE MY_DATA SET NAME = :name WHERE ID = :id",
//! );
//! let params = BindParams::new().bind("id", 110).bind("name", "new name");
//!
//! // Await directly
//! let result = upsert.upsert(&sqls, params.clone(), None).await?;
//!
//! // Or hand the result to a callback
//! upsert.call(sqls.clone(), params.clone()).on_done(|outcome| {
//!     if let Ok(result) = outcome {
//!         println!("rows affected: {}", result.rows_affected);
//!     }
//! });
//!
//! // Or start now and await later
//! let pending = upsert.call(sqls, params).deferred();
//! let result = pending.await?;
//! ```

pub mod bind;
pub mod call;
mod error;
pub mod executor;
#[cfg(test)]
mod mock;
pub mod options;
mod upsert;
pub mod value;

pub use bind::{filter_bind_params, BindParams, NamedParams};
pub use call::{Deferred, UpsertCall};
pub use error::{ErrorKind, ExecutorError, Result, UpsertError};
pub use executor::{BoxFuture, Row, StatementExecutor, WriteResult, ORACLE_DUPLICATE_KEY_MARKER};
pub use options::{ExecutionOptions, LobColumnMap, SqlTriple};
pub use upsert::{Fallback, Upsert};
pub use value::{BindValue, ToBindValue};
