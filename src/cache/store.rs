//! The cache contract the coordinator talks to.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{NewsRecord, TagRecord, TopicRecord};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache entry for `{key}`: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode field `{field}` of `{key}`: {source}")]
    Decode {
        key: &'static str,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Field-mapped cache for tags, topics and the current news listing.
///
/// Collection reads return records newest first. An empty collection reads as an
/// empty vector, never as an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Writes the tag only when its id is not cached yet.
    async fn set_tag(&self, tag: &TagRecord) -> Result<(), CacheError>;
    async fn unset_tag(&self, id: &str) -> Result<(), CacheError>;
    async fn get_tags(&self) -> Result<Vec<TagRecord>, CacheError>;
    /// Replaces the whole collection with `tags`.
    async fn reload_tags(&self, tags: &[TagRecord]) -> Result<(), CacheError>;

    async fn set_topic(&self, topic: &TopicRecord) -> Result<(), CacheError>;
    async fn unset_topic(&self, id: &str) -> Result<(), CacheError>;
    async fn get_topics(&self) -> Result<Vec<TopicRecord>, CacheError>;
    async fn reload_topics(&self, topics: &[TopicRecord]) -> Result<(), CacheError>;

    /// Marks the cached news listing stale.
    async fn invalidate_newses(&self) -> Result<(), CacheError>;

    /// True when the listing is stale, the flag is missing, or `filter` differs
    /// from the filter the listing was built for.
    async fn reload_required(&self, filter: &str) -> Result<bool, CacheError>;

    /// Drops one news entry and marks the listing stale.
    async fn unset_news(&self, id: &str) -> Result<(), CacheError>;

    /// Reads the listing and marks it fresh.
    async fn get_newses(&self) -> Result<Vec<NewsRecord>, CacheError>;

    /// Replaces the listing with `newses` and marks it fresh.
    async fn reload_newses(&self, newses: &[NewsRecord]) -> Result<(), CacheError>;

    async fn get_filter(&self) -> Result<Option<String>, CacheError>;
    async fn set_filter(&self, filter: &str) -> Result<(), CacheError>;
}
