//! Saved items, tags, and the document that holds them.
//!
//! The [`Document`] is the single unit of durability: every read and write
//! goes through the whole value. Wire shape is camelCase JSON so stored
//! documents look like `{"items": [...], "tags": [...]}`.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

pub mod validate;

/// Kind of captured content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Text,
    Code,
    Screenshot,
}

/// A saved snippet or screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    /// Text content, or a data URL for screenshots.
    pub content: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Page the content was captured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Fields supplied by the caller when creating an item.
///
/// `id` and `created_at` are assigned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub content: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewItem {
    /// Plain text item with no metadata.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            item_type: ItemType::Text,
            tag_ids: Vec::new(),
            url: None,
            title: None,
            note: None,
        }
    }
}

/// Partial update for an item.
///
/// Only fields that are present overwrite the stored item. For the optional
/// fields, `Some(None)` clears the value while `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub note: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl ItemPatch {
    /// Apply present fields on top of `item`.
    pub fn merge_into(self, item: &mut Item) {
        if let Some(content) = self.content {
            item.content = content;
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(tag_ids) = self.tag_ids {
            item.tag_ids = validate::dedup_ids(tag_ids);
        }
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(note) = self.note {
            item.note = note;
        }
    }
}

/// Fixed tag palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Red,
    Blue,
    Green,
    Purple,
    Yellow,
    Indigo,
    Pink,
    Orange,
}

impl TagColor {
    /// Every palette entry, in display order.
    pub const ALL: [TagColor; 8] = [
        TagColor::Red,
        TagColor::Blue,
        TagColor::Green,
        TagColor::Purple,
        TagColor::Yellow,
        TagColor::Indigo,
        TagColor::Pink,
        TagColor::Orange,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: TagColor,
}

/// All saved items (most recent first) and all tags (creation order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Document {
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    /// Tag whose name matches `name` case-insensitively, ignoring `except`.
    pub fn tag_named(&self, name: &str, except: Option<&str>) -> Option<&Tag> {
        let wanted = validate::name_key(name);
        self.tags
            .iter()
            .filter(|tag| Some(tag.id.as_str()) != except)
            .find(|tag| validate::name_key(&tag.name) == wanted)
    }

    /// Remove `tag_id` from the tag list and from every item.
    pub fn remove_tag(&mut self, tag_id: &str) {
        self.tags.retain(|tag| tag.id != tag_id);
        for item in &mut self.items {
            item.tag_ids.retain(|id| id != tag_id);
        }
    }

    /// Palette entries not used by any tag yet.
    pub fn available_colors(&self) -> Vec<TagColor> {
        TagColor::ALL
            .into_iter()
            .filter(|color| !self.tags.iter().any(|tag| tag.color == *color))
            .collect()
    }
}
