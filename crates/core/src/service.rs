//! Cached document service.
//!
//! Owns the in-memory copy of the [`Document`] and its freshness timestamp.
//! Reads are served from the cache while it is younger than the TTL and
//! reloaded from the [`DocumentStore`] otherwise. Mutations clone the current
//! snapshot, edit the clone, write the whole document through, and only then
//! swap it into the cache.
//!
//! Mutations are serialized by a mutex so two read-modify-write cycles never
//! interleave. Reads share the current `Arc<Document>` snapshot and may run
//! concurrently with each other and with an in-flight mutation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::Error;
use crate::config::AppConfig;
use crate::model::{Document, Item, ItemPatch, NewItem, Tag, TagColor, validate};
use crate::store::DocumentStore;

/// Staleness bound used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_millis(1_000);

/// Usage ratio at which [`StorageStatus::near_quota`] is set by default.
pub const DEFAULT_WARNING_RATIO: f64 = 0.9;

/// Outcome of editing the document copy inside a mutation.
enum Change<T> {
    /// The copy was modified and must be written back.
    Write(T),
    /// Nothing changed; skip the write.
    Skip(T),
}

#[derive(Debug)]
struct CacheState {
    document: Arc<Document>,
    refreshed_at: Option<Instant>,
}

impl CacheState {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.refreshed_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Storage usage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StorageStatus {
    pub bytes_in_use: u64,
    pub quota_bytes: Option<u64>,
    /// `bytes_in_use / quota_bytes`, or 0 without a quota.
    pub usage_ratio: f64,
    pub near_quota: bool,
}

/// Document service over a backing store.
///
/// One instance per process is expected; share it behind an `Arc`.
#[derive(Debug)]
pub struct DocumentService<S> {
    store: S,
    ttl: Duration,
    warning_ratio: f64,
    cache: RwLock<CacheState>,
    writer: Mutex<()>,
}

impl<S: DocumentStore> DocumentService<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            warning_ratio: DEFAULT_WARNING_RATIO,
            cache: RwLock::new(CacheState { document: Arc::default(), refreshed_at: None }),
            writer: Mutex::new(()),
        }
    }

    /// Build a service with the TTL and warning ratio from `config`.
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        let mut service = Self::with_ttl(store, config.cache_ttl());
        service.warning_ratio = config.storage_warning_ratio;
        service
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current document, reloaded first if the cache is stale.
    pub async fn document(&self) -> Result<Arc<Document>, Error> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh(self.ttl) {
                tracing::trace!("document cache hit");
                return Ok(Arc::clone(&cache.document));
            }
        }

        let mut cache = self.cache.write().await;
        if cache.is_fresh(self.ttl) {
            return Ok(Arc::clone(&cache.document));
        }

        let document = Arc::new(self.store.load().await?);
        tracing::debug!(items = document.items.len(), tags = document.tags.len(), "reloaded document from store");
        cache.document = Arc::clone(&document);
        cache.refreshed_at = Some(Instant::now());
        Ok(document)
    }

    /// Mark the cache stale so the next access reloads from the store.
    pub async fn invalidate(&self) {
        self.cache.write().await.refreshed_at = None;
    }

    pub async fn get_items(&self) -> Result<Vec<Item>, Error> {
        Ok(self.document().await?.items.clone())
    }

    pub async fn get_tags(&self) -> Result<Vec<Tag>, Error> {
        Ok(self.document().await?.tags.clone())
    }

    /// Create an item with a fresh id and timestamp at the front of the list.
    pub async fn add_item(&self, data: NewItem) -> Result<Item, Error> {
        self.mutate(|doc| {
            validate::title(data.title.as_deref())?;
            let tag_ids = validate::dedup_ids(data.tag_ids);
            validate::tag_refs(doc, &tag_ids)?;

            let item = Item {
                id: uuid::Uuid::new_v4().to_string(),
                content: data.content,
                item_type: data.item_type,
                tag_ids,
                created_at: chrono::Utc::now().timestamp_millis(),
                url: data.url,
                title: data.title,
                note: data.note,
            };
            doc.items.insert(0, item.clone());
            tracing::info!(id = %item.id, "added item");
            Ok(Change::Write(item))
        })
        .await
    }

    /// Merge the present fields of `patch` into item `id`.
    pub async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<Item, Error> {
        self.mutate(|doc| {
            let mut merged = doc.item(id).cloned().ok_or_else(|| Error::item_not_found(id))?;
            if let Some(tag_ids) = &patch.tag_ids {
                validate::tag_refs(doc, tag_ids)?;
            }
            patch.merge_into(&mut merged);
            validate::title(merged.title.as_deref())?;

            if let Some(slot) = doc.items.iter_mut().find(|item| item.id == id) {
                *slot = merged.clone();
            }
            tracing::info!(%id, "updated item");
            Ok(Change::Write(merged))
        })
        .await
    }

    /// Remove item `id`. Missing ids are not an error; the document is still
    /// written back.
    pub async fn delete_item(&self, id: &str) -> Result<(), Error> {
        self.mutate(|doc| {
            let before = doc.items.len();
            doc.items.retain(|item| item.id != id);
            tracing::info!(%id, removed = before - doc.items.len(), "deleted item");
            Ok(Change::Write(()))
        })
        .await
    }

    pub async fn clear_all_items(&self) -> Result<(), Error> {
        self.mutate(|doc| {
            tracing::info!(removed = doc.items.len(), "cleared items");
            doc.items.clear();
            Ok(Change::Write(()))
        })
        .await
    }

    /// Append a tag. Names are trimmed and must be unique ignoring case.
    pub async fn add_tag(&self, name: &str, color: TagColor) -> Result<Tag, Error> {
        self.mutate(|doc| insert_tag(doc, name, color)).await
    }

    /// Append a tag colored with the first palette entry no tag uses yet.
    ///
    /// The color is chosen inside the mutation so concurrent adds see each
    /// other's picks.
    pub async fn add_tag_with_unused_color(&self, name: &str) -> Result<Tag, Error> {
        self.mutate(|doc| {
            let color = doc.available_colors().first().copied().unwrap_or(TagColor::Blue);
            insert_tag(doc, name, color)
        })
        .await
    }

    /// Rename tag `id`. Returns the tag unchanged, without writing, when the
    /// trimmed name is identical to the current one.
    pub async fn update_tag(&self, id: &str, new_name: &str) -> Result<Tag, Error> {
        self.update_tag_fields(id, Some(new_name), None).await
    }

    pub async fn set_tag_color(&self, id: &str, color: TagColor) -> Result<Tag, Error> {
        self.update_tag_fields(id, None, Some(color)).await
    }

    /// Rename and recolor tag `id` in a single write.
    ///
    /// A name equal to the current one after trimming is not validated again.
    /// When neither field changes the tag is returned without writing.
    pub async fn update_tag_fields(
        &self, id: &str, name: Option<&str>, color: Option<TagColor>,
    ) -> Result<Tag, Error> {
        self.mutate(|doc| {
            let current = doc.tag(id).ok_or_else(|| Error::tag_not_found(id))?;
            let name = match name {
                Some(name) if name.trim() == current.name => None,
                Some(name) => Some(validate::tag_name(name)?),
                None => None,
            };
            let color = color.filter(|color| *color != current.color);
            if name.is_none() && color.is_none() {
                return Ok(Change::Skip(current.clone()));
            }
            if let Some(other) = name.as_deref().and_then(|name| doc.tag_named(name, Some(id))) {
                return Err(Error::DuplicateTag(other.name.clone()));
            }

            let tag = doc.tags.iter_mut().find(|tag| tag.id == id).ok_or_else(|| Error::tag_not_found(id))?;
            if let Some(name) = name {
                tag.name = name;
            }
            if let Some(color) = color {
                tag.color = color;
            }
            tracing::info!(%id, name = %tag.name, color = ?tag.color, "updated tag");
            Ok(Change::Write(tag.clone()))
        })
        .await
    }

    /// Remove tag `id` and strip it from every item in the same write.
    pub async fn delete_tag(&self, id: &str) -> Result<(), Error> {
        self.mutate(|doc| {
            doc.remove_tag(id);
            tracing::info!(%id, "deleted tag");
            Ok(Change::Write(()))
        })
        .await
    }

    /// Bytes used by the stored document against the store's quota.
    pub async fn storage_status(&self) -> Result<StorageStatus, Error> {
        let bytes_in_use = self.store.bytes_in_use().await?;
        let quota_bytes = self.store.quota_bytes();
        let usage_ratio = match quota_bytes {
            Some(quota) if quota > 0 => bytes_in_use as f64 / quota as f64,
            _ => 0.0,
        };
        let near_quota = quota_bytes.is_some() && usage_ratio >= self.warning_ratio;
        if near_quota {
            tracing::warn!(bytes_in_use, ?quota_bytes, "storage is nearly full");
        }
        Ok(StorageStatus { bytes_in_use, quota_bytes, usage_ratio, near_quota })
    }

    /// Run one read-modify-write cycle.
    ///
    /// `apply` edits a private copy of the current document; the cache keeps
    /// pointing at the old value until the write has been attempted.
    /// Validation errors abort before any write.
    async fn mutate<T, F>(&self, apply: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Document) -> Result<Change<T>, Error>,
    {
        let _guard = self.writer.lock().await;

        let current = self.document().await?;
        let mut next = Document::clone(&current);
        let value = match apply(&mut next)? {
            Change::Write(value) => value,
            Change::Skip(value) => return Ok(value),
        };

        let result = self.store.save(&next).await;

        let mut cache = self.cache.write().await;
        cache.document = Arc::new(next);
        match result {
            Ok(()) => {
                cache.refreshed_at = Some(Instant::now());
                Ok(value)
            }
            Err(e) => {
                cache.refreshed_at = None;
                tracing::warn!(error = %e, storage_full = e.is_storage_full(), "failed to persist document");
                Err(Error::Storage(e))
            }
        }
    }
}

fn insert_tag(doc: &mut Document, name: &str, color: TagColor) -> Result<Change<Tag>, Error> {
    let name = validate::tag_name(name)?;
    if let Some(existing) = doc.tag_named(&name, None) {
        return Err(Error::DuplicateTag(existing.name.clone()));
    }

    let tag = Tag { id: uuid::Uuid::new_v4().to_string(), name, color };
    doc.tags.push(tag.clone());
    tracing::info!(id = %tag.id, name = %tag.name, "added tag");
    Ok(Change::Write(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemType;
    use crate::store::{DOCUMENT_KEY, MemoryStore, SqliteStore};

    fn service() -> DocumentService<MemoryStore> {
        DocumentService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_empty_document_on_first_access() {
        let service = service();
        assert!(service.get_items().await.unwrap().is_empty());
        assert!(service.get_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_item_prepends() {
        let service = service();
        let first = service.add_item(NewItem::text("one")).await.unwrap();
        let second = service.add_item(NewItem::text("two")).await.unwrap();
        let third = service.add_item(NewItem::text("three")).await.unwrap();

        let items = service.get_items().await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);
        assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_add_item_assigns_identity() {
        let service = service();
        let a = service.add_item(NewItem::text("same")).await.unwrap();
        let b = service.add_item(NewItem::text("same")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.created_at > 0);
        assert_eq!(service.store().load().await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_update_item_merges() {
        let service = service();
        let item = service
            .add_item(NewItem { title: Some("A".into()), note: Some("B".into()), ..NewItem::text("hello") })
            .await
            .unwrap();

        let patch = ItemPatch { title: Some(Some("C".into())), ..Default::default() };
        let updated = service.update_item(&item.id, patch).await.unwrap();

        assert_eq!(updated.title.as_deref(), Some("C"));
        assert_eq!(updated.note.as_deref(), Some("B"));
        assert_eq!(updated.content, "hello");
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.created_at, item.created_at);
        assert_eq!(service.get_items().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_update_item_missing() {
        let service = service();
        let err = service.update_item("nope", ItemPatch::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "item", .. }));
    }

    #[tokio::test]
    async fn test_update_item_keeps_unknown_stored_tag() {
        let store = MemoryStore::new();
        let mut stored = Document::default();
        stored.items.push(Item {
            id: "i1".into(),
            content: "hello".into(),
            item_type: ItemType::Text,
            tag_ids: vec!["ghost".into()],
            created_at: 1_700_000_000_000,
            url: None,
            title: None,
            note: None,
        });
        store.save(&stored).await.unwrap();
        let service = DocumentService::new(store);

        let patch = ItemPatch { title: Some(Some("C".into())), ..Default::default() };
        let updated = service.update_item("i1", patch).await.unwrap();
        assert_eq!(updated.title.as_deref(), Some("C"));
        assert_eq!(updated.tag_ids, vec!["ghost".to_string()]);

        let patch = ItemPatch { tag_ids: Some(vec!["ghost".into()]), ..Default::default() };
        let err = service.update_item("i1", patch).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "tag", .. }));
    }

    #[tokio::test]
    async fn test_item_rejects_unknown_tag() {
        let service = service();
        let data = NewItem { tag_ids: vec!["ghost".into()], ..NewItem::text("x") };
        let err = service.add_item(data).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "tag", .. }));
        assert!(service.store().load().await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_title_too_long_writes_nothing() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::new(store.clone());
        let item = service.add_item(NewItem::text("x")).await.unwrap();

        let patch = ItemPatch { title: Some(Some("t".repeat(validate::TITLE_MAX_CHARS + 1))), ..Default::default() };
        let err = service.update_item(&item.id, patch).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.revision(DOCUMENT_KEY).await.unwrap(), 1);
        assert!(service.get_items().await.unwrap()[0].title.is_none());
    }

    #[tokio::test]
    async fn test_delete_item_idempotent() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::new(store.clone());
        service.add_item(NewItem::text("a")).await.unwrap();
        service.add_item(NewItem::text("b")).await.unwrap();
        let before = service.get_items().await.unwrap();

        service.delete_item("missing").await.unwrap();

        assert_eq!(service.get_items().await.unwrap(), before);
        assert_eq!(store.revision(DOCUMENT_KEY).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let service = service();
        let a = service.add_item(NewItem::text("a")).await.unwrap();
        let b = service.add_item(NewItem::text("b")).await.unwrap();

        service.delete_item(&a.id).await.unwrap();

        assert_eq!(service.get_items().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_clear_all_items_keeps_tags() {
        let service = service();
        let tag = service.add_tag("Work", TagColor::Blue).await.unwrap();
        service.add_item(NewItem { tag_ids: vec![tag.id.clone()], ..NewItem::text("a") }).await.unwrap();

        service.clear_all_items().await.unwrap();

        assert!(service.get_items().await.unwrap().is_empty());
        assert_eq!(service.get_tags().await.unwrap(), vec![tag]);
    }

    #[tokio::test]
    async fn test_add_tag_appends_trimmed() {
        let service = service();
        let work = service.add_tag("  Work ", TagColor::Blue).await.unwrap();
        let home = service.add_tag("Home", TagColor::Green).await.unwrap();

        assert_eq!(work.name, "Work");
        assert_eq!(service.get_tags().await.unwrap(), vec![work, home]);
    }

    #[tokio::test]
    async fn test_add_tag_duplicate_case_insensitive() {
        let service = service();
        service.add_tag("Work", TagColor::Blue).await.unwrap();

        let err = service.add_tag("work", TagColor::Red).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateTag(_)));

        let err = service.add_tag(" WORK ", TagColor::Red).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateTag(_)));
        assert_eq!(service.get_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_tag_empty_name() {
        let service = service();
        let err = service.add_tag("   ", TagColor::Blue).await.unwrap_err();
        assert!(matches!(err, Error::EmptyName));
    }

    #[tokio::test]
    async fn test_update_tag() {
        let service = service();
        let work = service.add_tag("Work", TagColor::Blue).await.unwrap();
        service.add_tag("Home", TagColor::Green).await.unwrap();

        let err = service.update_tag(&work.id, "home").await.unwrap_err();
        assert!(matches!(err, Error::DuplicateTag(_)));

        let err = service.update_tag("missing", "Other").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "tag", .. }));

        let err = service.update_tag(&work.id, " ").await.unwrap_err();
        assert!(matches!(err, Error::EmptyName));

        let renamed = service.update_tag(&work.id, "Office").await.unwrap();
        assert_eq!(renamed.name, "Office");
        assert_eq!(renamed.color, TagColor::Blue);
        assert_eq!(service.get_tags().await.unwrap()[0], renamed);
    }

    #[tokio::test]
    async fn test_update_tag_case_only_rename() {
        let service = service();
        let tag = service.add_tag("work", TagColor::Blue).await.unwrap();
        let renamed = service.update_tag(&tag.id, "Work").await.unwrap();
        assert_eq!(renamed.name, "Work");
    }

    #[tokio::test]
    async fn test_update_tag_same_name_skips_write() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::new(store.clone());
        let tag = service.add_tag("Work", TagColor::Blue).await.unwrap();

        let unchanged = service.update_tag(&tag.id, "  Work  ").await.unwrap();

        assert_eq!(unchanged, tag);
        assert_eq!(store.revision(DOCUMENT_KEY).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_tag_color() {
        let service = service();
        let tag = service.add_tag("Work", TagColor::Blue).await.unwrap();
        let recolored = service.set_tag_color(&tag.id, TagColor::Pink).await.unwrap();
        assert_eq!(recolored.color, TagColor::Pink);
        assert_eq!(recolored.name, "Work");
        assert!(service.set_tag_color("missing", TagColor::Red).await.is_err());
    }

    #[tokio::test]
    async fn test_update_tag_fields_single_write() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::new(store.clone());
        let tag = service.add_tag("Work", TagColor::Red).await.unwrap();

        let updated = service
            .update_tag_fields(&tag.id, Some("Office"), Some(TagColor::Purple))
            .await
            .unwrap();

        assert_eq!(updated.name, "Office");
        assert_eq!(updated.color, TagColor::Purple);
        assert_eq!(store.revision(DOCUMENT_KEY).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_tag_fields_failed_write_persists_nothing() {
        let tag = Tag { id: "t1".into(), name: "Work".into(), color: TagColor::Red };
        let renamed = Document { items: vec![], tags: vec![Tag { name: "Office".into(), ..tag.clone() }] };
        let store = MemoryStore::with_quota(serde_json::to_vec(&renamed).unwrap().len() as u64);
        store.save(&Document { items: vec![], tags: vec![tag.clone()] }).await.unwrap();
        let service = DocumentService::new(store.clone());

        let err = service
            .update_tag_fields(&tag.id, Some("Office"), Some(TagColor::Purple))
            .await
            .unwrap_err();

        assert!(err.is_storage_full());
        assert_eq!(store.load().await.unwrap().tags, vec![tag]);
    }

    #[tokio::test]
    async fn test_update_tag_fields_duplicate_writes_nothing() {
        let service = service();
        let work = service.add_tag("Work", TagColor::Red).await.unwrap();
        service.add_tag("Home", TagColor::Blue).await.unwrap();

        let err = service
            .update_tag_fields(&work.id, Some("HOME"), Some(TagColor::Pink))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateTag(_)));
        assert_eq!(service.get_tags().await.unwrap()[0], work);
    }

    #[tokio::test]
    async fn test_update_tag_unchanged_long_name_is_noop() {
        let store = MemoryStore::new();
        let long_name = "x".repeat(validate::TAG_NAME_MAX_CHARS + 4);
        let mut stored = Document::default();
        stored.tags.push(Tag { id: "t1".into(), name: long_name.clone(), color: TagColor::Red });
        store.save(&stored).await.unwrap();
        let service = DocumentService::new(store);

        let unchanged = service.update_tag("t1", &format!(" {long_name} ")).await.unwrap();
        assert_eq!(unchanged.name, long_name);

        let err = service.update_tag("t1", &"y".repeat(validate::TAG_NAME_MAX_CHARS + 1)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_unused_colors_differ() {
        let service = Arc::new(service());
        let handles: Vec<_> = ["Work", "Home", "Reading", "Recipes"]
            .into_iter()
            .map(|name| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.add_tag_with_unused_color(name).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tags = service.get_tags().await.unwrap();
        assert_eq!(tags.len(), 4);
        assert_eq!(service.document().await.unwrap().available_colors().len(), TagColor::ALL.len() - 4);
    }

    #[tokio::test]
    async fn test_delete_tag_cascades() {
        let service = service();
        let work = service.add_tag("Work", TagColor::Blue).await.unwrap();
        let home = service.add_tag("Home", TagColor::Green).await.unwrap();
        for content in ["a", "b", "c"] {
            let data = NewItem { tag_ids: vec![work.id.clone(), home.id.clone()], ..NewItem::text(content) };
            service.add_item(data).await.unwrap();
        }

        service.delete_tag(&work.id).await.unwrap();

        let stored = service.store().load().await.unwrap();
        assert_eq!(stored.tags, vec![home.clone()]);
        assert!(stored.items.iter().all(|i| i.tag_ids == vec![home.id.clone()]));
        assert_eq!(service.document().await.unwrap().as_ref(), &stored);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::new(store);

        let work = service.add_tag("Work", TagColor::Blue).await.unwrap();
        let item = service
            .add_item(NewItem {
                content: "hello".into(),
                item_type: ItemType::Text,
                tag_ids: vec![],
                url: None,
                title: None,
                note: None,
            })
            .await
            .unwrap();
        let patch = ItemPatch { tag_ids: Some(vec![work.id.clone()]), ..Default::default() };
        service.update_item(&item.id, patch).await.unwrap();

        let items = service.get_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tag_ids, vec![work.id.clone()]);

        service.delete_tag(&work.id).await.unwrap();

        let items = service.get_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
        assert!(items[0].tag_ids.is_empty());
    }

    #[tokio::test]
    async fn test_reads_served_from_cache_within_ttl() {
        let store = MemoryStore::new();
        let service = DocumentService::with_ttl(store.clone(), Duration::from_secs(30));
        assert!(service.get_items().await.unwrap().is_empty());

        let mut external = Document::default();
        external.tags.push(Tag { id: "t1".into(), name: "Elsewhere".into(), color: TagColor::Red });
        store.save(&external).await.unwrap();

        assert!(service.get_tags().await.unwrap().is_empty());

        service.invalidate().await;
        assert_eq!(service.get_tags().await.unwrap(), external.tags);
    }

    #[tokio::test]
    async fn test_external_write_visible_after_ttl() {
        let store = SqliteStore::open_in_memory(None).await.unwrap();
        let service = DocumentService::with_ttl(store.clone(), Duration::from_millis(100));
        service.add_item(NewItem::text("local")).await.unwrap();

        store.save(&Document::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(service.get_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_always_reloads() {
        let store = MemoryStore::new();
        let service = DocumentService::with_ttl(store.clone(), Duration::ZERO);
        service.add_tag("Work", TagColor::Blue).await.unwrap();

        store.save(&Document::default()).await.unwrap();

        assert!(service.get_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_marks_cache_stale() {
        let store = MemoryStore::with_quota(256);
        let service = DocumentService::new(store.clone());
        let kept = service.add_item(NewItem::text("small")).await.unwrap();

        let err = service.add_item(NewItem::text("x".repeat(512))).await.unwrap_err();
        assert!(err.is_storage_full());

        {
            let cache = service.cache.read().await;
            assert!(cache.refreshed_at.is_none());
            assert_eq!(cache.document.items.len(), 2);
        }

        assert_eq!(store.load().await.unwrap().items, vec![kept.clone()]);
        assert_eq!(service.get_items().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_storage_status() {
        let service = DocumentService::new(MemoryStore::with_quota(100));
        let status = service.storage_status().await.unwrap();
        assert_eq!(status.bytes_in_use, 0);
        assert!(!status.near_quota);

        service.add_tag("Work", TagColor::Blue).await.unwrap();
        let status = service.storage_status().await.unwrap();
        assert!(status.bytes_in_use > 90);
        assert_eq!(status.quota_bytes, Some(100));
        assert!(status.near_quota);
    }

    #[tokio::test]
    async fn test_storage_status_without_quota() {
        let service = DocumentService::new(MemoryStore::new());
        service.add_item(NewItem::text("a")).await.unwrap();
        let status = service.storage_status().await.unwrap();
        assert_eq!(status.usage_ratio, 0.0);
        assert!(!status.near_quota);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutations_do_not_lose_updates() {
        let service = Arc::new(service());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.add_item(NewItem::text(format!("item {i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.get_items().await.unwrap().len(), 16);
        assert_eq!(service.store().load().await.unwrap().items.len(), 16);
    }
}
