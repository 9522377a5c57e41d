//! Protocol request router.
//!
//! Maps each [`Request`] onto the catalog reader or the read-only executor and
//! shapes the outcome into a protocol payload. Every handler that touches the
//! database checks out its own session and releases it by dropping it.

use crate::db::{ConnectionSource, catalog, executor};
use crate::error::{DbError, DbResult};
use crate::models::{
    CallToolPayload, JSON_MIME_TYPE, ListResourcesPayload, ListToolsPayload, QueryArguments,
    ReadResourcePayload, Request, ResourceContents, ResourceEntry, ResourceId, ResourceKind,
    Response, ToolDescriptor, ToolName,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use url::Url;

pub const QUERY_TOOL_DESCRIPTION: &str = "Run a read-only SQL query";

/// Dispatches protocol requests against a connection source.
#[derive(Debug, Clone)]
pub struct Router<P> {
    source: P,
    base_url: Url,
}

impl<P: ConnectionSource> Router<P> {
    /// `base_url` is the credential-free `mysql://host:port/database/` prefix
    /// that resource URIs are built under.
    pub fn new(source: P, base_url: Url) -> Self {
        Self { source, base_url }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Handle one request.
    ///
    /// `Err` is a protocol-level failure. A failed query is not one: it comes
    /// back as a [`CallToolPayload`] with `is_error` set.
    pub async fn handle(&self, request: Request) -> DbResult<Response> {
        match request {
            Request::ListResources => self.list_resources().await.map(Response::ListResources),
            Request::ReadResource { uri } => {
                self.read_resource(&uri).await.map(Response::ReadResource)
            }
            Request::ListTools => Ok(Response::ListTools(self.list_tools())),
            Request::CallTool { name, arguments } => {
                self.call_tool(&name, arguments).await.map(Response::CallTool)
            }
        }
    }

    /// One schema resource per table of the configured database.
    pub async fn list_resources(&self) -> DbResult<ListResourcesPayload> {
        let mut session = self.source.acquire().await?;
        let tables = catalog::list_tables(&mut session).await?;
        drop(session);

        let resources = tables
            .iter()
            .map(|table| {
                let uri = ResourceId::schema(&table.name).to_uri(&self.base_url)?;
                Ok(ResourceEntry::table_schema(uri, &table.name))
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ListResourcesPayload { resources })
    }

    /// The column list of the table named by `uri`.
    ///
    /// The URI is validated before a connection is acquired.
    pub async fn read_resource(&self, uri: &str) -> DbResult<ReadResourcePayload> {
        let id = ResourceId::parse(uri)?;

        let text = match id.kind {
            ResourceKind::Schema => {
                let mut session = self.source.acquire().await?;
                let columns = catalog::describe_columns(&mut session, &id.table).await?;
                drop(session);
                serde_json::to_string_pretty(&columns)
                    .map_err(|e| DbError::internal(format!("Failed to serialize columns: {}", e)))?
            }
        };

        Ok(ReadResourcePayload {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: JSON_MIME_TYPE.to_string(),
                text,
            }],
        })
    }

    pub fn list_tools(&self) -> ListToolsPayload {
        ListToolsPayload {
            tools: vec![query_tool()],
        }
    }

    /// Run a tool. Unknown tool names fail before any connection is acquired.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, JsonValue>>,
    ) -> DbResult<CallToolPayload> {
        let tool: ToolName = name.parse()?;
        match tool {
            ToolName::Query => self.query(arguments).await,
        }
    }

    async fn query(
        &self,
        arguments: Option<serde_json::Map<String, JsonValue>>,
    ) -> DbResult<CallToolPayload> {
        let args: QueryArguments =
            match serde_json::from_value(JsonValue::Object(arguments.unwrap_or_default())) {
                Ok(args) => args,
                Err(e) => {
                    let err = DbError::invalid_input(format!(
                        "arguments for tool '{}': {}",
                        ToolName::Query,
                        e
                    ));
                    debug!(error = %err, "Rejected tool arguments");
                    return Ok(CallToolPayload::error(tool_error_message(&err)));
                }
            };

        let mut session = self.source.acquire().await?;
        let outcome = executor::run_read_only(&mut session, &args.sql).await;
        drop(session);

        match outcome {
            Ok(result) => {
                info!(rows = result.row_count(), "Query tool succeeded");
                let text = result
                    .to_pretty_json()
                    .map_err(|e| DbError::internal(format!("Failed to serialize rows: {}", e)))?;
                Ok(CallToolPayload::success(text))
            }
            Err(e) => {
                debug!(error = %e, "Query tool failed");
                Ok(CallToolPayload::error(tool_error_message(&e)))
            }
        }
    }
}

/// Descriptor of the `query` tool.
pub fn query_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: ToolName::Query.to_string(),
        description: QUERY_TOOL_DESCRIPTION.to_string(),
        input_schema: schemars::schema_for!(QueryArguments).to_value(),
    }
}

fn tool_error_message(err: &DbError) -> String {
    match err {
        DbError::Query {
            sql_state: Some(code),
            ..
        } => format!("{} (SQLSTATE: {})", err, code),
        _ => err.to_string(),
    }
}
