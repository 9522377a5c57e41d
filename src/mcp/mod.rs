//! MCP server integration module.
//!
//! The router holds the protocol semantics; the service adapts it to the
//! rmcp framework.

pub mod router;
pub mod service;

pub use router::Router;
pub use service::McpService;
