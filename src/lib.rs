//! MySQL MCP Server Library
//!
//! Exposes one MySQL database to MCP clients: each table's column list is a
//! resource, and the `query` tool runs SQL inside a read-only transaction that
//! is always rolled back.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::{McpService, Router};
