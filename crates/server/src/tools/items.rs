//! Item tools: items_list, items_add, items_update, items_delete, items_clear.

use quicksave_core::{DocumentService, DocumentStore, Item, ItemPatch, NewItem};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the items_add tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemsAddParams {
    #[serde(flatten)]
    pub item: NewItem,
}

/// Parameters for the items_update tool.
///
/// Only the fields present are changed; pass `null` to clear url, title, or note.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemsUpdateParams {
    /// Id of the item to update.
    pub id: String,

    #[serde(flatten)]
    pub patch: ItemPatch,
}

/// Parameters for the items_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemsDeleteParams {
    /// Id of the item to delete. Unknown ids are ignored.
    pub id: String,
}

/// Parameters for the items_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemsClearParams {
    /// Must be true; guards against clearing by accident.
    pub confirm: bool,
}

/// Output listing saved items, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemsOutput {
    pub count: usize,
    pub items: Vec<Item>,
}

/// Output from tools returning a single item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemOutput {
    pub item: Item,
}

/// Output from tools that only acknowledge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AckOutput {
    pub ok: bool,
}

pub async fn list_impl<S: DocumentStore>(service: &DocumentService<S>) -> Result<CallToolResult, McpError> {
    let items = service.get_items().await?;
    json_result(&ItemsOutput { count: items.len(), items })
}

pub async fn add_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: ItemsAddParams,
) -> Result<CallToolResult, McpError> {
    let item = service.add_item(params.item).await?;
    json_result(&ItemOutput { item })
}

pub async fn update_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: ItemsUpdateParams,
) -> Result<CallToolResult, McpError> {
    if params.id.trim().is_empty() {
        return Err(ToolError::InvalidInput("id cannot be empty".into()).into());
    }
    let item = service.update_item(&params.id, params.patch).await?;
    json_result(&ItemOutput { item })
}

pub async fn delete_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: ItemsDeleteParams,
) -> Result<CallToolResult, McpError> {
    service.delete_item(&params.id).await?;
    json_result(&AckOutput { ok: true })
}

pub async fn clear_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: ItemsClearParams,
) -> Result<CallToolResult, McpError> {
    if !params.confirm {
        return Err(ToolError::InvalidInput("confirm must be true to clear all items".into()).into());
    }
    service.clear_all_items().await?;
    json_result(&AckOutput { ok: true })
}
