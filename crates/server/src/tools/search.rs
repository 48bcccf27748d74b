//! items_search tool implementation.
//!
//! Filters saved items by a case-insensitive substring and by tags. The
//! core only hands out the document; the query semantics live here.

use quicksave_core::{DocumentService, DocumentStore, Item, Tag};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::items::ItemsOutput;
use super::json_result;

/// Parameters for the items_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemsSearchParams {
    /// Substring matched against content, title, note, and tag names.
    #[serde(default)]
    pub query: Option<String>,

    /// Keep items carrying at least one of these tags.
    #[serde(default)]
    pub tag_ids: Vec<String>,

    /// Maximum number of items to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Items matching `query` and any of `tag_ids`, in document order.
///
/// An empty query and an empty tag list match everything.
pub fn search_items<'a>(items: &'a [Item], tags: &[Tag], query: &str, tag_ids: &[String]) -> Vec<&'a Item> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| tag_ids.is_empty() || tag_ids.iter().any(|id| item.tag_ids.contains(id)))
        .filter(|item| needle.is_empty() || matches_text(item, tags, &needle))
        .collect()
}

fn matches_text(item: &Item, tags: &[Tag], needle: &str) -> bool {
    let contains = |field: Option<&str>| field.is_some_and(|s| s.to_lowercase().contains(needle));

    contains(Some(item.content.as_str()))
        || contains(item.title.as_deref())
        || contains(item.note.as_deref())
        || tags
            .iter()
            .filter(|tag| item.tag_ids.contains(&tag.id))
            .any(|tag| tag.name.to_lowercase().contains(needle))
}

/// Implementation of the items_search tool.
pub async fn search_impl<S: DocumentStore>(
    service: &DocumentService<S>, params: ItemsSearchParams,
) -> Result<CallToolResult, McpError> {
    let doc = service.document().await?;
    let query = params.query.as_deref().unwrap_or("");

    let mut items: Vec<Item> = search_items(&doc.items, &doc.tags, query, &params.tag_ids)
        .into_iter()
        .cloned()
        .collect();
    if let Some(limit) = params.limit {
        items.truncate(limit);
    }

    tracing::debug!(query, matched = items.len(), "searched items");
    json_result(&ItemsOutput { count: items.len(), items })
}
