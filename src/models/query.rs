//! Query-related data models.
//!
//! This module defines the `query` tool's arguments and its result rows.

use crate::db::types::Row;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryArguments {
    /// SQL statement to run. It executes inside a read-only transaction that is always rolled back.
    pub sql: String,
}

/// Rows returned by a query, in the order the server produced them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Pretty-printed JSON array of row objects.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_arguments_require_sql() {
        let args: QueryArguments =
            serde_json::from_value(serde_json::json!({"sql": "SELECT 1"})).unwrap();
        assert_eq!(args.sql, "SELECT 1");

        assert!(serde_json::from_value::<QueryArguments>(serde_json::json!({})).is_err());
        assert!(serde_json::from_value::<QueryArguments>(serde_json::json!({"sql": 1})).is_err());
    }

    #[test]
    fn test_query_arguments_schema() {
        let schema = schemars::schema_for!(QueryArguments).to_value();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["sql"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["sql"]));
    }

    #[test]
    fn test_result_serializes_as_array() {
        let mut row = Row::new();
        row.push("x", 1);
        let result = QueryResult::new(vec![row]);
        let parsed: serde_json::Value =
            serde_json::from_str(&result.to_pretty_json().unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!([{"x": 1}]));
        assert_eq!(result.row_count(), 1);
    }
}
