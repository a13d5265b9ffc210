//! Scripted executor used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::bind::NamedParams;
use crate::error::ExecutorError;
use crate::executor::{BoxFuture, Row, StatementExecutor, WriteResult};
use crate::options::ExecutionOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Query,
    Insert,
    Update,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub op: Op,
    pub sql: String,
    pub params: NamedParams,
    pub options: ExecutionOptions,
}

/// Returns queued responses in order and records every call. A call with no
/// queued response panics, so unexpected statements fail the test.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    queries: Mutex<VecDeque<Result<Vec<Row>, ExecutorError>>>,
    inserts: Mutex<VecDeque<Result<WriteResult, ExecutorError>>>,
    updates: Mutex<VecDeque<Result<WriteResult, ExecutorError>>>,
    calls: Mutex<Vec<Call>>,
    marker: Option<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = Some(marker.to_string());
        self
    }

    pub fn rows(self, count: usize) -> Self {
        let row: Row = [("ID".to_string(), 1_i64.into())].into_iter().collect();
        self.queries.lock().unwrap().push_back(Ok(vec![row; count]));
        self
    }

    pub fn query_error(self, message: &str) -> Self {
        self.queries
            .lock()
            .unwrap()
            .push_back(Err(ExecutorError::new(message)));
        self
    }

    pub fn inserted(self, rows_affected: u64) -> Self {
        self.inserts
            .lock()
            .unwrap()
            .push_back(Ok(WriteResult::new(rows_affected)));
        self
    }

    pub fn insert_error(self, message: &str) -> Self {
        self.inserts
            .lock()
            .unwrap()
            .push_back(Err(ExecutorError::new(message)));
        self
    }

    pub fn updated(self, rows_affected: u64) -> Self {
        self.updates
            .lock()
            .unwrap()
            .push_back(Ok(WriteResult::new(rows_affected)));
        self
    }

    pub fn update_error(self, message: &str) -> Self {
        self.updates
            .lock()
            .unwrap()
            .push_back(Err(ExecutorError::new(message)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.op == op).count()
    }

    fn record(&self, op: Op, sql: &str, params: NamedParams, options: &ExecutionOptions) {
        self.calls.lock().unwrap().push(Call {
            op,
            sql: sql.to_string(),
            params,
            options: options.clone(),
        });
    }

    fn next<T>(queue: &Mutex<VecDeque<T>>, op: Op) -> T {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {op:?} call"))
    }
}

impl StatementExecutor for ScriptedExecutor {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<Vec<Row>, ExecutorError>> {
        Box::pin(async move {
            self.record(Op::Query, sql, params, options);
            tokio::task::yield_now().await;
            Self::next(&self.queries, Op::Query)
        })
    }

    fn insert<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        Box::pin(async move {
            self.record(Op::Insert, sql, params, options);
            tokio::task::yield_now().await;
            Self::next(&self.inserts, Op::Insert)
        })
    }

    fn update<'a>(
        &'a self,
        sql: &'a str,
        params: NamedParams,
        options: &'a ExecutionOptions,
    ) -> BoxFuture<'a, Result<WriteResult, ExecutorError>> {
        Box::pin(async move {
            self.record(Op::Update, sql, params, options);
            tokio::task::yield_now().await;
            Self::next(&self.updates, Op::Update)
        })
    }

    fn duplicate_key_marker(&self) -> &str {
        self.marker
            .as_deref()
            .unwrap_or(crate::executor::ORACLE_DUPLICATE_KEY_MARKER)
    }
}
