//! Schema catalog reader.
//!
//! Reads table and column metadata from `information_schema` for the database
//! the connection was opened on.

use crate::db::pool::SqlSession;
use crate::db::types::Row;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, TableDescriptor};
use tracing::debug;

// Some MySQL builds report information_schema text as VARBINARY, hence CONVERT.
pub const LIST_TABLES_SQL: &str = "SELECT CONVERT(TABLE_NAME USING utf8mb4) AS table_name \
     FROM information_schema.tables \
     WHERE table_schema = DATABASE()";

pub const DESCRIBE_COLUMNS_SQL: &str = "SELECT CONVERT(COLUMN_NAME USING utf8mb4) AS column_name, \
     CONVERT(DATA_TYPE USING utf8mb4) AS data_type \
     FROM information_schema.columns \
     WHERE table_name = ? AND table_schema = DATABASE() \
     ORDER BY ORDINAL_POSITION";

/// List the tables of the current database, in catalog order.
pub async fn list_tables<S: SqlSession>(session: &mut S) -> DbResult<Vec<TableDescriptor>> {
    let rows = session
        .fetch(LIST_TABLES_SQL, &[])
        .await
        .map_err(|e| e.in_operation("list tables"))?;

    let tables = rows
        .iter()
        .map(|row| text_column(row, "table_name").map(TableDescriptor::new))
        .collect::<DbResult<Vec<_>>>()
        .map_err(|e| e.in_operation("list tables"))?;

    debug!(count = tables.len(), "Listed tables");
    Ok(tables)
}

/// Describe the columns of `table`, in ordinal order.
///
/// A table that does not exist yields an empty list.
pub async fn describe_columns<S: SqlSession>(
    session: &mut S,
    table: &str,
) -> DbResult<Vec<ColumnDescriptor>> {
    let rows = session
        .fetch(DESCRIBE_COLUMNS_SQL, &[table])
        .await
        .map_err(|e| e.in_operation("describe columns"))?;

    let columns = rows
        .iter()
        .map(|row| {
            Ok(ColumnDescriptor::new(
                text_column(row, "column_name")?,
                text_column(row, "data_type")?,
            ))
        })
        .collect::<DbResult<Vec<_>>>()
        .map_err(|e| e.in_operation("describe columns"))?;

    debug!(table, count = columns.len(), "Described columns");
    Ok(columns)
}

fn text_column(row: &Row, name: &str) -> DbResult<String> {
    row.get(name)
        .and_then(|value| value.as_text())
        .map(str::to_string)
        .ok_or_else(|| {
            DbError::query(
                "query",
                format!("Catalog row has no text column '{}'", name),
                None,
            )
        })
}
