//! Statement sequence of the read-only executor.

mod common;

use common::{FakePool, row};
use mysql_mcp_server::db::CellValue;
use mysql_mcp_server::db::executor::{
    ROLLBACK_SQL, SET_READ_ONLY_SQL, START_TRANSACTION_SQL, run_read_only,
};
use mysql_mcp_server::error::DbError;

#[tokio::test]
async fn test_successful_query_is_wrapped_and_rolled_back() {
    let pool = FakePool::new().with_rows(vec![
        row(&[("id", CellValue::Integer(1)), ("name", "ada".into())]),
        row(&[("id", CellValue::Integer(2)), ("name", CellValue::Null)]),
    ]);
    let mut session = pool.session();

    let result = run_read_only(&mut session, "SELECT id, name FROM users")
        .await
        .unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!([{"id": 1, "name": "ada"}, {"id": 2, "name": null}])
    );
    assert_eq!(
        pool.statements(),
        vec![
            SET_READ_ONLY_SQL,
            START_TRANSACTION_SQL,
            "SELECT id, name FROM users",
            ROLLBACK_SQL
        ]
    );
    assert!(!session.transaction_open());
}

#[tokio::test]
async fn test_sql_is_passed_through_verbatim() {
    let pool = FakePool::new();
    let mut session = pool.session();
    let sql = "  select\n  *\nfrom `weird table` -- trailing comment";

    run_read_only(&mut session, sql).await.unwrap();

    assert_eq!(pool.statements()[2], sql);
}

#[tokio::test]
async fn test_start_failure_skips_sql_but_attempts_rollback() {
    let pool = FakePool::new().failing_on(START_TRANSACTION_SQL);
    let mut session = pool.session();

    let err = run_read_only(&mut session, "DELETE FROM users")
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Query { .. }));
    assert_eq!(
        pool.statements(),
        vec![SET_READ_ONLY_SQL, START_TRANSACTION_SQL, ROLLBACK_SQL]
    );
    assert!(!session.transaction_open());
}

#[tokio::test]
async fn test_failed_rollback_leaves_transaction_flagged() {
    let pool = FakePool::new().failing_on(ROLLBACK_SQL);
    let mut session = pool.session();

    let result = run_read_only(&mut session, "SELECT 1").await;

    assert!(result.is_ok());
    assert!(session.transaction_open());
    drop(session);
    assert_eq!(pool.released(), 1);
    assert_eq!(pool.discarded(), 1);
}

#[tokio::test]
async fn test_query_error_is_returned_after_rollback() {
    let pool = FakePool::new().failing_on("DROP TABLE users");
    let mut session = pool.session();

    let err = run_read_only(&mut session, "DROP TABLE users")
        .await
        .unwrap_err();

    match err {
        DbError::Query { sql_state, .. } => assert_eq!(sql_state.as_deref(), Some("HY000")),
        other => panic!("expected query error, got {other:?}"),
    }
    assert_eq!(pool.statements().last().map(String::as_str), Some(ROLLBACK_SQL));
    assert!(!session.transaction_open());
}
