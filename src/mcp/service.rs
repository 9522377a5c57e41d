//! MCP service implementation using rmcp.
//!
//! `McpService` implements the rmcp server handler by turning each rmcp
//! request into a [`Request`] for the [`Router`] and re-typing the router's
//! payload as the matching rmcp result.

use crate::db::ConnectionSource;
use crate::mcp::router::Router;
use crate::models::Request;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListResourcesResult,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam,
        ReadResourceResult, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// MCP service exposing table schemas as resources and the `query` tool.
#[derive(Debug)]
pub struct McpService<P> {
    router: Arc<Router<P>>,
}

impl<P> Clone for McpService<P> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<P: ConnectionSource + 'static> McpService<P> {
    pub fn new(router: Router<P>) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    pub fn router(&self) -> &Router<P> {
        &self.router
    }

    async fn dispatch<T: DeserializeOwned>(&self, request: Request) -> Result<T, McpError> {
        debug!(request = ?request, "Handling request");
        let response = self.router.handle(request).await.map_err(|e| {
            warn!(error = %e, "Request failed");
            McpError::from(e)
        })?;
        into_model(&response)
    }
}

/// Re-type a payload as the rmcp model with the same wire shape.
pub fn into_model<T: DeserializeOwned>(payload: &impl Serialize) -> Result<T, McpError> {
    serde_json::to_value(payload)
        .and_then(serde_json::from_value)
        .map_err(|e| McpError::internal_error(format!("Failed to build protocol result: {}", e), None))
}

impl<P: ConnectionSource + 'static> ServerHandler for McpService<P> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to one MySQL database.\n\
                \n\
                ## Resources\n\
                Each table has a schema resource `mysql://<host>:<port>/<database>/<table>/schema`\n\
                whose JSON text lists the table's columns (`name`, `dataType`) in order.\n\
                Call resources/list to discover them.\n\
                \n\
                ## Tools\n\
                - `query`: run one SQL statement (`sql`). It executes inside a read-only\n\
                  transaction that is always rolled back, so writes never persist.\n\
                  Rows come back as a JSON array of objects. Failed queries return an\n\
                  error result carrying the MySQL message."
                    .to_string(),
            ),
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        self.dispatch(Request::ListResources)
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        self.dispatch(Request::ReadResource { uri: request.uri })
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        self.dispatch(Request::ListTools)
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        self.dispatch(Request::CallTool {
            name: request.name.into_owned(),
            arguments: request.arguments,
        })
    }
}
