//! Connection pool management.
//!
//! The rest of the crate talks to the database through two traits:
//! [`ConnectionSource`] hands out sessions, and a [`SqlSession`] is one pooled
//! connection checked out for the duration of a single request. Releasing a
//! session means dropping it.

use crate::config::PoolOptions;
use crate::db::types::Row;
use crate::error::{DbError, DbResult};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql, MySqlPool};
use std::future::Future;
use tracing::{debug, warn};

/// Something that can hand out pooled database sessions.
pub trait ConnectionSource: Send + Sync {
    type Session: SqlSession;

    /// Check out a session, waiting for a free slot if the pool is exhausted.
    ///
    /// Fails with [`DbError::Connection`] when the server is unreachable, the
    /// credentials are rejected or the acquire timeout elapses.
    fn acquire(&self) -> impl Future<Output = DbResult<Self::Session>> + Send;
}

/// A pooled connection checked out for one request.
///
/// Dropping the session releases it. A session dropped while
/// [`set_transaction_open`](SqlSession::set_transaction_open) is still `true`
/// must not go back to the pool.
pub trait SqlSession: Send {
    /// Run a statement and discard any rows it produces.
    fn execute(&mut self, sql: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Run one statement and collect its rows, binding `params` to its `?`
    /// placeholders.
    ///
    /// The statement is prepared server-side, which accepts exactly one
    /// statement: a `;`-separated batch is rejected before any part of it runs.
    fn fetch(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> impl Future<Output = DbResult<Vec<Row>>> + Send;

    /// Record whether an explicit transaction is open on this connection.
    fn set_transaction_open(&mut self, open: bool);
}

/// MySQL connection pool shared by every request.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: MySqlPool,
}

impl DbPool {
    /// Build the pool without connecting.
    ///
    /// The first connection is made when the first request acquires one, so a
    /// server that is down at startup only fails the requests that need it.
    pub fn connect_lazy(options: MySqlConnectOptions, pool_options: PoolOptions) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(pool_options.max_connections)
            .min_connections(pool_options.min_connections)
            .acquire_timeout(pool_options.acquire_timeout)
            .idle_timeout(Some(pool_options.idle_timeout))
            .connect_lazy_with(options);
        Self { pool }
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ConnectionSource for DbPool {
    type Session = MySqlSession;

    async fn acquire(&self) -> DbResult<MySqlSession> {
        let conn = self.pool.acquire().await.map_err(|e| {
            DbError::connection(
                format!("Failed to acquire connection: {}", e),
                connection_suggestion(&e),
            )
        })?;
        debug!(
            pool_size = self.pool.size(),
            idle = self.pool.num_idle(),
            "Acquired pooled connection"
        );
        Ok(MySqlSession::new(conn))
    }
}

/// A checked-out MySQL connection.
pub struct MySqlSession {
    conn: Option<PoolConnection<MySql>>,
    transaction_open: bool,
}

impl MySqlSession {
    fn new(conn: PoolConnection<MySql>) -> Self {
        Self {
            conn: Some(conn),
            transaction_open: false,
        }
    }

    fn connection(&mut self) -> DbResult<&mut PoolConnection<MySql>> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::internal("Session used after release"))
    }
}

impl SqlSession for MySqlSession {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        let conn = self.connection()?;
        (&mut **conn).execute(sql).await?;
        Ok(())
    }

    async fn fetch(&mut self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let conn = self.connection()?;
        // Caller SQL is arbitrary; keep it out of the statement cache.
        let mut query = sqlx::query(sql).persistent(false);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(&mut **conn).await?;
        Ok(rows.iter().map(Row::from_mysql).collect())
    }

    fn set_transaction_open(&mut self, open: bool) {
        self.transaction_open = open;
    }
}

impl Drop for MySqlSession {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.transaction_open {
            // The server aborts the transaction when the socket goes away.
            warn!("Discarding connection with an open transaction instead of pooling it");
            drop(conn.detach());
        } else {
            drop(conn);
        }
    }
}

impl std::fmt::Debug for MySqlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSession")
            .field("released", &self.conn.is_none())
            .field("transaction_open", &self.transaction_open)
            .finish()
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    if matches!(error, sqlx::Error::PoolTimedOut) {
        return "All pooled connections are busy; retry later or raise --max-connections"
            .to_string();
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and accessible".to_string();
    }

    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify MYSQL_USER and MYSQL_PASSWORD".to_string();
    }

    if error_str.contains("unknown database") {
        return "Check that MYSQL_DATABASE names an existing database".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    "Verify MYSQL_HOST and MYSQL_PORT point at a MySQL server".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_for_pool_timeout() {
        let suggestion = connection_suggestion(&sqlx::Error::PoolTimedOut);
        assert!(suggestion.contains("max-connections"));
    }

    #[test]
    fn test_suggestion_for_refused_connection() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert!(connection_suggestion(&err).contains("running"));
    }

    #[test]
    fn test_suggestion_fallback() {
        let err = sqlx::Error::Protocol("unexpected packet".to_string());
        assert!(connection_suggestion(&err).contains("MYSQL_HOST"));
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let options = MySqlConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("none");
        let pool = DbPool::connect_lazy(
            options,
            PoolOptions {
                max_connections: 1,
                min_connections: 0,
                acquire_timeout: std::time::Duration::from_millis(200),
                idle_timeout: std::time::Duration::from_secs(1),
            },
        );
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }));
        pool.close().await;
    }
}
