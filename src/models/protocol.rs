//! Protocol requests and result payloads.
//!
//! Payloads serialize to the MCP wire shapes (camelCase keys) so they can be
//! handed to any MCP transport as-is.

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

pub const JSON_MIME_TYPE: &str = "application/json";

/// An inbound request the router knows how to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListResources,
    ReadResource {
        uri: String,
    },
    ListTools,
    CallTool {
        name: String,
        arguments: Option<serde_json::Map<String, JsonValue>>,
    },
}

/// The tools this server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Query,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            other => Err(DbError::unknown_tool(other)),
        }
    }
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub uri: String,
    pub mime_type: String,
    pub name: String,
}

impl ResourceEntry {
    /// Entry for a table's schema resource.
    pub fn table_schema(uri: impl Into<String>, table: &str) -> Self {
        Self {
            uri: uri.into(),
            mime_type: JSON_MIME_TYPE.to_string(),
            name: format!("\"{}\" database schema", table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResourcesPayload {
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourcePayload {
    pub contents: Vec<ResourceContents>,
}

// =============================================================================
// Tools
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsPayload {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolPayload {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl CallToolPayload {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Concatenated text of all content items.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect()
    }
}

/// Result of handling a [`Request`], one variant per request kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    ListResources(ListResourcesPayload),
    ReadResource(ReadResourcePayload),
    ListTools(ListToolsPayload),
    CallTool(CallToolPayload),
}
