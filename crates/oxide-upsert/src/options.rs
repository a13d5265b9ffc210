//! Statement texts and execution options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maps a large-object column name to the bind parameter carrying its value.
pub type LobColumnMap = BTreeMap<String, String>;

/// The three caller-supplied statements of an upsert.
///
/// # Example
///
/// ```rust
/// use oxide_upsert::SqlTriple;
///
/// let sqls = SqlTriple::new(
///     "SELECT ID FROM MY_DATA WHERE ID = :id",
///     "INSERT INTO MY_DATA (ID, NAME) VALUES (:id, :name)",
///     "UPDATE MY_DATA SET NAME = :name WHERE ID = :id",
/// );
/// assert!(sqls.insert.starts_with("INSERT"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTriple {
    /// The existence probe (a SELECT).
    pub query: String,
    /// The INSERT statement.
    pub insert: String,
    /// The UPDATE statement.
    pub update: String,
}

impl SqlTriple {
    /// Creates a statement triple.
    pub fn new(
        query: impl Into<String>,
        insert: impl Into<String>,
        update: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            insert: insert.into(),
            update: update.into(),
        }
    }
}

/// Options handed to every executor call.
///
/// Field names follow the camelCase keys used on the wire (`maxRows`,
/// `resultSet`, `autoCommit`, `lobMetaInfo`). Keys this type does not know
/// are kept in [`extra`](Self::extra) and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Maximum number of rows a query returns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u32>,
    /// Whether a query returns a cursor handle instead of a row collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set: Option<bool>,
    /// Transaction flag, interpreted by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_commit: Option<bool>,
    /// LOB columns and their bind parameter names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lob_meta_info: Option<LobColumnMap>,
    /// Executor-specific options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ExecutionOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row cap for queries.
    #[must_use]
    pub const fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Sets the result-set flag.
    #[must_use]
    pub const fn result_set(mut self, result_set: bool) -> Self {
        self.result_set = Some(result_set);
        self
    }

    /// Sets the auto-commit flag.
    #[must_use]
    pub const fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = Some(auto_commit);
        self
    }

    /// Registers a LOB column and the bind parameter that carries its value.
    #[must_use]
    pub fn lob_column(mut self, column: impl Into<String>, param: impl Into<String>) -> Self {
        self.lob_meta_info
            .get_or_insert_with(LobColumnMap::new)
            .insert(column.into(), param.into());
        self
    }

    /// Adds an executor-specific option.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns a copy tuned for the existence probe: one row, as a plain
    /// row collection.
    #[must_use]
    pub fn for_probe(&self) -> Self {
        let mut probe = self.clone();
        probe.max_rows = Some(1);
        probe.result_set = Some(false);
        probe
    }
}
