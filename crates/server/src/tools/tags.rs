//! Tag tools: tags_list, tags_add, tags_update, tags_delete.

use quicksave_core::{DocumentService, DocumentStore, Tag, TagColor};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::items::AckOutput;
use super::json_result;
use crate::error::ToolError;

/// Parameters for the tags_add tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagsAddParams {
    /// Tag name; trimmed, unique ignoring case.
    pub name: String,

    /// Palette color. Defaults to the first color no tag uses yet.
    #[serde(default)]
    pub color: Option<TagColor>,
}

/// Parameters for the tags_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagsUpdateParams {
    pub id: String,

    /// New name.
    #[serde(default)]
    pub name: Option<String>,

    /// New palette color.
    #[serde(default)]
    pub color: Option<TagColor>,
}

/// Parameters for the tags_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagsDeleteParams {
    /// Id of the tag to delete; it is also removed from every item.
    pub id: String,
}

/// Output from the tags_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagsOutput {
    pub tags: Vec<Tag>,
    /// Palette colors not used by any tag.
    pub available_colors: Vec<TagColor>,
}

/// Output from tools returning a single tag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagOutput {
    pub tag: Tag,
}

pub async fn list_impl<S: DocumentStore>(service: &DocumentService<S>) -> Result<CallToolResult, McpError> {
    let doc = service.document().await?;
    json_result(&TagsOutput { tags: doc.tags.clone(), available_colors: doc.available_colors() })
}

pub async fn add_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: TagsAddParams,
) -> Result<CallToolResult, McpError> {
    let tag = match params.color {
        Some(color) => service.add_tag(&params.name, color).await?,
        None => service.add_tag_with_unused_color(&params.name).await?,
    };
    json_result(&TagOutput { tag })
}

pub async fn update_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: TagsUpdateParams,
) -> Result<CallToolResult, McpError> {
    if params.name.is_none() && params.color.is_none() {
        return Err(ToolError::InvalidInput("At least one of name or color must be specified".into()).into());
    }

    let tag = service
        .update_tag_fields(&params.id, params.name.as_deref(), params.color)
        .await?;
    json_result(&TagOutput { tag })
}

pub async fn delete_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: TagsDeleteParams,
) -> Result<CallToolResult, McpError> {
    service.delete_tag(&params.id).await?;
    json_result(&AckOutput { ok: true })
}
