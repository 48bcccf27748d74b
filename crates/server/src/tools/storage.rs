//! storage_status tool implementation.

use quicksave_core::{DocumentService, DocumentStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

pub async fn status_impl<S: DocumentStore>(service: &DocumentService<S>) -> Result<CallToolResult, McpError> {
    let status = service.storage_status().await?;
    json_result(&status)
}
