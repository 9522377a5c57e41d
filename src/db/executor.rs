//! Read-only query execution.
//!
//! Every caller statement runs inside a transaction opened with
//! `SET TRANSACTION READ ONLY` and is rolled back afterwards, whether it
//! succeeded or not. The SQL text itself is never inspected.

use crate::db::pool::SqlSession;
use crate::error::{DbError, DbResult};
use crate::models::QueryResult;
use std::time::Instant;
use tracing::{debug, warn};

pub const SET_READ_ONLY_SQL: &str = "SET TRANSACTION READ ONLY";
pub const START_TRANSACTION_SQL: &str = "START TRANSACTION";
pub const ROLLBACK_SQL: &str = "ROLLBACK";

/// Run `sql` on `session` inside a read-only transaction that is always
/// rolled back.
///
/// If the transaction cannot be set up the caller's SQL is not executed. A
/// failed rollback is logged and leaves the session flagged as holding an open
/// transaction, so it is closed instead of pooled; the query's own outcome is
/// returned either way.
pub async fn run_read_only<S: SqlSession>(session: &mut S, sql: &str) -> DbResult<QueryResult> {
    let start = Instant::now();
    debug!(sql = %sql, "Executing read-only query");

    session.execute(SET_READ_ONLY_SQL).await?;

    // Flag first: a failed or cancelled START leaves the connection state unknown.
    session.set_transaction_open(true);
    let outcome = match session.execute(START_TRANSACTION_SQL).await {
        Ok(()) => session.fetch(sql, &[]).await,
        Err(e) => Err(e),
    };

    match session.execute(ROLLBACK_SQL).await {
        Ok(()) => session.set_transaction_open(false),
        Err(e) => {
            let warning = DbError::rollback(e.to_string());
            warn!(error = %warning, "Connection will be discarded");
        }
    }

    let rows = outcome?;
    debug!(
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query completed"
    );
    Ok(QueryResult::new(rows))
}
