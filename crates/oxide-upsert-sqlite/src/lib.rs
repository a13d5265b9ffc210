//! # oxide-upsert-sqlite
//!
//! A [`StatementExecutor`](oxide_upsert::StatementExecutor) for SQLite, built
//! on an sqlx [`SqlitePool`](sqlx::sqlite::SqlitePool).
//!
//! - `:name` placeholders are rewritten to numbered `?N` placeholders and
//!   bound by position (see [`named`]).
//! - Queries honor `max_rows`; row values are decoded by storage class.
//! - Inserts report the affected rows and `last_insert_rowid()`.
//! - Unique and primary key violations are recognized by
//!   [`SQLITE_DUPLICATE_KEY_MARKER`], so a racing insert falls back to the
//!   update.
//!
//! SQLite has its own `INSERT ... ON CONFLICT` clause; this executor is for
//! code that keeps the probe/insert/update protocol portable across
//! databases.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oxide_upsert::{BindParams, SqlTriple, Upsert};
//! use oxide_upsert_sqlite::SqliteExecutor;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite:db.sqlite3").await?;
//! let upsert = Upsert::new(SqliteExecutor::new(pool));
//!
//! let result = upsert
//!     .upsert(
//!         &SqlTriple::new(
//!             "SELECT id FROM users WHERE id = :id",
//!             "INSERT INTO users (id, name) VALUES (:id, :name)",
//!             "UPDATE users SET name = :name WHERE id = :id",
//!         ),
//!         BindParams::new().bind("id", 1).bind("name", "Alice"),
//!         None,
//!     )
//!     .await?;
//! ```

mod error;
mod executor;
pub mod named;

pub use error::{Result, SqliteExecutorError};
pub use executor::{SqliteExecutor, SQLITE_DUPLICATE_KEY_MARKER};
