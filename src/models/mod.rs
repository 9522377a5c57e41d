//! Data models for the MySQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod protocol;
pub mod query;
pub mod resource;
pub mod schema;

// Re-export commonly used types
pub use protocol::{
    CallToolPayload, JSON_MIME_TYPE, ListResourcesPayload, ListToolsPayload, ReadResourcePayload,
    Request, ResourceContents, ResourceEntry, Response, ToolContent, ToolDescriptor, ToolName,
};
pub use query::{QueryArguments, QueryResult};
pub use resource::{ResourceId, ResourceKind};
pub use schema::{ColumnDescriptor, TableDescriptor};
