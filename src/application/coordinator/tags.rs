use std::sync::Arc;

use tracing::instrument;

use crate::application::repos::{CreateTagParams, TagsRepo, UpdateTagParams};
use crate::cache::{CacheStore, Collection};
use crate::domain::entities::TagRecord;
use crate::domain::error::ensure_non_blank;

use super::{CoordinatorError, record_fallback, record_hit, record_miss, tolerate};

#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn TagsRepo>,
    cache: Arc<dyn CacheStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn TagsRepo>, cache: Arc<dyn CacheStore>) -> Self {
        Self { store, cache }
    }

    /// Persists a tag and caches it. A cache failure is reported even though the
    /// tag is already durable.
    #[instrument(skip(self))]
    pub async fn add_tag(&self, label: &str) -> Result<TagRecord, CoordinatorError> {
        ensure_non_blank(label, "tag")?;
        let tag = self
            .store
            .create_tag(CreateTagParams {
                label: label.trim().to_string(),
            })
            .await?;
        self.cache.set_tag(&tag).await?;
        Ok(tag)
    }

    /// Evicts the cached entry, updates the store, then caches the new value.
    ///
    /// The eviction must succeed before the store is touched: the cache only adds
    /// absent entries, so a stale entry left behind would never be replaced.
    #[instrument(skip(self))]
    pub async fn edit_tag(&self, id: &str, label: &str) -> Result<TagRecord, CoordinatorError> {
        ensure_non_blank(label, "tag")?;
        self.cache.unset_tag(id).await?;
        let tag = self
            .store
            .modify_tag(UpdateTagParams {
                id: id.to_string(),
                label: label.trim().to_string(),
            })
            .await?;
        self.cache.set_tag(&tag).await?;
        Ok(tag)
    }

    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: &str) -> Result<(), CoordinatorError> {
        self.store.remove_tag(id).await?;
        self.cache.unset_tag(id).await?;
        Ok(())
    }

    /// Serves the cached collection, falling back to the store when it is empty or
    /// unreadable. Repopulating the cache afterwards is best-effort.
    #[instrument(skip(self))]
    pub async fn get_tags(&self) -> Result<Vec<TagRecord>, CoordinatorError> {
        if let Some(tags) = tolerate("get_tags", self.cache.get_tags().await) {
            if !tags.is_empty() {
                record_hit(Collection::Tags);
                return Ok(tags);
            }
        }
        record_miss(Collection::Tags);

        let tags = self.store.list_tags().await?;
        record_fallback(Collection::Tags);
        if !tags.is_empty() {
            tolerate("reload_tags", self.cache.reload_tags(&tags).await);
        }
        Ok(tags)
    }
}
