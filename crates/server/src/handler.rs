//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    items::{self, ItemsAddParams, ItemsClearParams, ItemsDeleteParams, ItemsUpdateParams},
    search::{ItemsSearchParams, search_impl},
    storage::status_impl,
    tags::{self, TagsAddParams, TagsDeleteParams, TagsUpdateParams},
};
use quicksave_core::{DocumentService, SqliteStore};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for quicksave.
#[derive(Clone)]
pub struct QuicksaveServer {
    service: Arc<DocumentService<SqliteStore>>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl QuicksaveServer {
    /// Create a new server handler over a shared document service.
    pub fn new(service: Arc<DocumentService<SqliteStore>>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    #[tool(description = "List saved items, most recent first.")]
    async fn items_list(&self) -> Result<CallToolResult, McpError> {
        items::list_impl(&self.service).await
    }

    #[tool(description = "Save a text, code, or screenshot item with optional tags, title, note, and source url.")]
    async fn items_add(&self, params: Parameters<ItemsAddParams>) -> Result<CallToolResult, McpError> {
        items::add_impl(&self.service, params.0).await
    }

    #[tool(description = "Update fields of a saved item. Fields not given are left unchanged.")]
    async fn items_update(&self, params: Parameters<ItemsUpdateParams>) -> Result<CallToolResult, McpError> {
        items::update_impl(&self.service, params.0).await
    }

    #[tool(description = "Delete a saved item by id. Unknown ids are ignored.")]
    async fn items_delete(&self, params: Parameters<ItemsDeleteParams>) -> Result<CallToolResult, McpError> {
        items::delete_impl(&self.service, params.0).await
    }

    #[tool(description = "Delete every saved item. Tags are kept.")]
    async fn items_clear(&self, params: Parameters<ItemsClearParams>) -> Result<CallToolResult, McpError> {
        items::clear_impl(&self.service, params.0).await
    }

    #[tool(description = "Search saved items by substring (content, title, note, tag names) and by tag ids.")]
    async fn items_search(&self, params: Parameters<ItemsSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.service, params.0).await
    }

    #[tool(description = "List tags in creation order, with palette colors still unused.")]
    async fn tags_list(&self) -> Result<CallToolResult, McpError> {
        tags::list_impl(&self.service).await
    }

    #[tool(description = "Create a tag. Names are unique ignoring case.")]
    async fn tags_add(&self, params: Parameters<TagsAddParams>) -> Result<CallToolResult, McpError> {
        tags::add_impl(&self.service, params.0).await
    }

    #[tool(description = "Rename and/or recolor a tag.")]
    async fn tags_update(&self, params: Parameters<TagsUpdateParams>) -> Result<CallToolResult, McpError> {
        tags::update_impl(&self.service, params.0).await
    }

    #[tool(description = "Delete a tag and remove it from every item.")]
    async fn tags_delete(&self, params: Parameters<TagsDeleteParams>) -> Result<CallToolResult, McpError> {
        tags::delete_impl(&self.service, params.0).await
    }

    #[tool(description = "Report bytes used by saved data against the storage quota.")]
    async fn storage_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.service).await
    }
}

impl ServerHandler for QuicksaveServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "quicksave".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
