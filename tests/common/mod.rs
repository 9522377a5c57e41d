//! Scripted in-memory connection source shared by the integration tests.
//!
//! Sessions record every statement they receive and count acquisitions,
//! releases and discards, so tests can check exactly what reached the
//! "database" and that every session was handed back.

#![allow(dead_code)]

use mysql_mcp_server::db::catalog::{DESCRIBE_COLUMNS_SQL, LIST_TABLES_SQL};
use mysql_mcp_server::db::{CellValue, ConnectionSource, Row, SqlSession};
use mysql_mcp_server::error::{DbError, DbResult};
use mysql_mcp_server::mcp::Router;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Caller SQL containing this marker never completes.
pub const HANG_MARKER: &str = "/* hang */";

#[derive(Default)]
struct Script {
    fail_acquire: bool,
    failing: HashSet<String>,
    tables: Vec<String>,
    columns: HashMap<String, Vec<(String, String)>>,
    rows: Vec<Row>,
}

#[derive(Default)]
struct State {
    script: Mutex<Script>,
    statements: Mutex<Vec<String>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
    discarded: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakePool {
    state: Arc<State>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.state.script.lock().unwrap()
    }

    pub fn with_tables(self, tables: &[&str]) -> Self {
        self.script().tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_columns(self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.script().columns.insert(
            table.to_string(),
            columns
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.to_string()))
                .collect(),
        );
        self
    }

    /// Rows returned for any caller SQL.
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.script().rows = rows;
        self
    }

    pub fn failing_acquire(self) -> Self {
        self.script().fail_acquire = true;
        self
    }

    /// Make the exact statement `sql` fail with a query error.
    pub fn failing_on(self, sql: &str) -> Self {
        self.script().failing.insert(sql.to_string());
        self
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Sessions dropped while a transaction was still open.
    pub fn discarded(&self) -> usize {
        self.state.discarded.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }

    pub fn session(&self) -> FakeSession {
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        FakeSession {
            state: Arc::clone(&self.state),
            transaction_open: false,
        }
    }
}

impl ConnectionSource for FakePool {
    type Session = FakeSession;

    async fn acquire(&self) -> DbResult<FakeSession> {
        if self.script().fail_acquire {
            return Err(DbError::connection(
                "Failed to acquire connection: Connection refused",
                "Check that the MySQL server is running and accessible",
            ));
        }
        Ok(self.session())
    }
}

pub struct FakeSession {
    state: Arc<State>,
    transaction_open: bool,
}

impl FakeSession {
    pub fn transaction_open(&self) -> bool {
        self.transaction_open
    }

    /// Record `sql` and decide whether it fails.
    fn record(&self, sql: &str) -> DbResult<()> {
        self.state.statements.lock().unwrap().push(sql.to_string());
        if self.state.script.lock().unwrap().failing.contains(sql) {
            return Err(DbError::query(
                "query",
                format!("scripted failure for '{}'", sql),
                Some("HY000".to_string()),
            ));
        }
        Ok(())
    }

    fn rows_for(&self, sql: &str, params: &[&str]) -> Vec<Row> {
        let script = self.state.script.lock().unwrap();
        if sql == LIST_TABLES_SQL {
            script
                .tables
                .iter()
                .map(|t| [("table_name", CellValue::from(t.as_str()))].into_iter().collect())
                .collect()
        } else if sql == DESCRIBE_COLUMNS_SQL {
            let table = params.first().copied().unwrap_or_default();
            script
                .columns
                .get(table)
                .map(|columns| {
                    columns
                        .iter()
                        .map(|(name, ty)| {
                            [
                                ("column_name", CellValue::from(name.as_str())),
                                ("data_type", CellValue::from(ty.as_str())),
                            ]
                            .into_iter()
                            .collect()
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else {
            script.rows.clone()
        }
    }
}

impl SqlSession for FakeSession {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.record(sql)
    }

    async fn fetch(&mut self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        self.record(sql)?;
        if sql.contains(HANG_MARKER) {
            std::future::pending::<()>().await;
        }
        Ok(self.rows_for(sql, params))
    }

    fn set_transaction_open(&mut self, open: bool) {
        self.transaction_open = open;
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
        if self.transaction_open {
            self.state.discarded.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn base_url() -> Url {
    Url::parse("mysql://localhost:3306/shop/").unwrap()
}

pub fn router(pool: &FakePool) -> Router<FakePool> {
    Router::new(pool.clone(), base_url())
}

pub fn row(cells: &[(&str, CellValue)]) -> Row {
    cells.iter().cloned().collect()
}
