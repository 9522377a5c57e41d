//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Read-only query execution
//! - Schema catalog reads
//! - Row and cell types

pub mod catalog;
pub mod executor;
pub mod pool;
pub mod types;

pub use catalog::{describe_columns, list_tables};
pub use executor::run_read_only;
pub use pool::{ConnectionSource, DbPool, MySqlSession, SqlSession};
pub use types::{CellValue, Row};
