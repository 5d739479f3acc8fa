//! In-process cache backend.
//!
//! Collections are stored as `id -> JSON` maps so entries can be added and evicted
//! one at a time while reads still return whole collections. Writes to the news
//! reload flag happen while the collection lock is held, so the flag a single call
//! leaves behind matches the listing it read or wrote. An invalidation landing
//! between a `reload_required` check and the following `get_newses` is not kept.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::entities::{
    Cached, NewsRecord, TagRecord, TopicRecord, sort_newest_first,
};

use super::keys::{Collection, FILTER_NEWSES, FLAG_FRESH, FLAG_STALE, RELOAD_NEWSES};
use super::lock::{rw_read, rw_write};
use super::store::{CacheError, CacheStore};

const SOURCE: &str = "cache::memory";

type Fields = HashMap<String, String>;

#[derive(Debug, Default)]
pub struct MemoryCache {
    collections: RwLock<HashMap<Collection, Fields>>,
    scalars: RwLock<HashMap<&'static str, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_if_absent<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        record: &T,
        op: &'static str,
    ) -> Result<(), CacheError> {
        let encoded = encode(collection, record)?;
        let mut guard = rw_write(&self.collections, SOURCE, op);
        guard
            .entry(collection)
            .or_default()
            .entry(id.to_string())
            .or_insert(encoded);
        Ok(())
    }

    fn remove_field(&self, collection: Collection, id: &str, op: &'static str) {
        let mut guard = rw_write(&self.collections, SOURCE, op);
        if let Some(fields) = guard.get_mut(&collection) {
            fields.remove(id);
        }
    }

    fn read_all<T: DeserializeOwned + Cached>(
        &self,
        collection: Collection,
        op: &'static str,
    ) -> Result<Vec<T>, CacheError> {
        let guard = rw_read(&self.collections, SOURCE, op);
        let mut records = match guard.get(&collection) {
            Some(fields) => decode_all(collection, fields)?,
            None => Vec::new(),
        };
        drop(guard);
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn replace_all<T: Serialize + Cached>(
        &self,
        collection: Collection,
        records: &[T],
        op: &'static str,
    ) -> Result<(), CacheError> {
        let fields = encode_all(collection, records)?;
        rw_write(&self.collections, SOURCE, op).insert(collection, fields);
        Ok(())
    }

    fn set_flag(&self, value: &str, op: &'static str) {
        let _collections = rw_write(&self.collections, SOURCE, op);
        rw_write(&self.scalars, SOURCE, op).insert(RELOAD_NEWSES, value.to_string());
    }
}

fn encode<T: Serialize>(collection: Collection, record: &T) -> Result<String, CacheError> {
    serde_json::to_string(record).map_err(|source| CacheError::Encode {
        key: collection.as_str(),
        source,
    })
}

fn encode_all<T: Serialize + Cached>(
    collection: Collection,
    records: &[T],
) -> Result<Fields, CacheError> {
    records
        .iter()
        .map(|record| Ok((record.cache_id().to_string(), encode(collection, record)?)))
        .collect()
}

fn decode_all<T: DeserializeOwned>(
    collection: Collection,
    fields: &Fields,
) -> Result<Vec<T>, CacheError> {
    fields
        .iter()
        .map(|(field, raw)| {
            serde_json::from_str(raw).map_err(|source| CacheError::Decode {
                key: collection.as_str(),
                field: field.clone(),
                source,
            })
        })
        .collect()
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn set_tag(&self, tag: &TagRecord) -> Result<(), CacheError> {
        self.set_if_absent(Collection::Tags, &tag.id, tag, "set_tag")
    }

    async fn unset_tag(&self, id: &str) -> Result<(), CacheError> {
        self.remove_field(Collection::Tags, id, "unset_tag");
        Ok(())
    }

    async fn get_tags(&self) -> Result<Vec<TagRecord>, CacheError> {
        self.read_all(Collection::Tags, "get_tags")
    }

    async fn reload_tags(&self, tags: &[TagRecord]) -> Result<(), CacheError> {
        self.replace_all(Collection::Tags, tags, "reload_tags")
    }

    async fn set_topic(&self, topic: &TopicRecord) -> Result<(), CacheError> {
        self.set_if_absent(Collection::Topics, &topic.id, topic, "set_topic")
    }

    async fn unset_topic(&self, id: &str) -> Result<(), CacheError> {
        self.remove_field(Collection::Topics, id, "unset_topic");
        Ok(())
    }

    async fn get_topics(&self) -> Result<Vec<TopicRecord>, CacheError> {
        self.read_all(Collection::Topics, "get_topics")
    }

    async fn reload_topics(&self, topics: &[TopicRecord]) -> Result<(), CacheError> {
        self.replace_all(Collection::Topics, topics, "reload_topics")
    }

    async fn invalidate_newses(&self) -> Result<(), CacheError> {
        self.set_flag(FLAG_STALE, "invalidate_newses");
        Ok(())
    }

    async fn reload_required(&self, filter: &str) -> Result<bool, CacheError> {
        let scalars = rw_read(&self.scalars, SOURCE, "reload_required");
        let fresh = scalars.get(RELOAD_NEWSES).map(String::as_str) == Some(FLAG_FRESH);
        let same_filter = scalars.get(FILTER_NEWSES).map(String::as_str) == Some(filter);
        Ok(!fresh || !same_filter)
    }

    async fn unset_news(&self, id: &str) -> Result<(), CacheError> {
        let mut collections = rw_write(&self.collections, SOURCE, "unset_news");
        if let Some(fields) = collections.get_mut(&Collection::News) {
            fields.remove(id);
        }
        rw_write(&self.scalars, SOURCE, "unset_news")
            .insert(RELOAD_NEWSES, FLAG_STALE.to_string());
        Ok(())
    }

    async fn get_newses(&self) -> Result<Vec<NewsRecord>, CacheError> {
        let collections = rw_read(&self.collections, SOURCE, "get_newses");
        let mut newses: Vec<NewsRecord> = match collections.get(&Collection::News) {
            Some(fields) => decode_all(Collection::News, fields)?,
            None => Vec::new(),
        };
        rw_write(&self.scalars, SOURCE, "get_newses")
            .insert(RELOAD_NEWSES, FLAG_FRESH.to_string());
        drop(collections);
        sort_newest_first(&mut newses);
        Ok(newses)
    }

    async fn reload_newses(&self, newses: &[NewsRecord]) -> Result<(), CacheError> {
        let fields = encode_all(Collection::News, newses)?;
        let mut collections = rw_write(&self.collections, SOURCE, "reload_newses");
        collections.insert(Collection::News, fields);
        rw_write(&self.scalars, SOURCE, "reload_newses")
            .insert(RELOAD_NEWSES, FLAG_FRESH.to_string());
        Ok(())
    }

    async fn get_filter(&self) -> Result<Option<String>, CacheError> {
        Ok(rw_read(&self.scalars, SOURCE, "get_filter")
            .get(FILTER_NEWSES)
            .cloned())
    }

    async fn set_filter(&self, filter: &str) -> Result<(), CacheError> {
        rw_write(&self.scalars, SOURCE, "set_filter").insert(FILTER_NEWSES, filter.to_string());
        Ok(())
    }
}
