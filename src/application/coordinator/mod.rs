//! Cache-aside coordination between the relational store and the cache.
//!
//! Reads are served from the cache when possible and rebuilt from the store on a
//! miss. Writes go to the store and then evict or invalidate the affected cache
//! entries. Which cache failures abort an operation and which are only logged is
//! decided per operation in the service modules.

mod news;
mod tags;
mod topics;

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::application::repos::{RelationalStore, RepoError};
use crate::cache::{CacheError, CacheStore, Collection};
use crate::domain::entities::{NewsRecord, TagRecord, TopicRecord};
use crate::domain::error::DomainError;
use crate::domain::filter::NewsFilter;

pub use news::{NewsDraft, NewsService};
pub use tags::TagService;
pub use topics::TopicService;

pub(crate) const METRIC_CACHE_HIT: &str = "newsroom_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "newsroom_cache_miss_total";
pub(crate) const METRIC_STORE_FALLBACK: &str = "newsroom_store_fallback_total";
pub(crate) const METRIC_CACHE_ERROR: &str = "newsroom_cache_error_total";

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error("cache operation failed: {0}")]
    Cache(#[from] CacheError),
}

impl CoordinatorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoordinatorError::Store(RepoError::NotFound))
    }
}

fn record_hit(collection: Collection) {
    counter!(METRIC_CACHE_HIT, "collection" => collection.as_str()).increment(1);
}

fn record_miss(collection: Collection) {
    counter!(METRIC_CACHE_MISS, "collection" => collection.as_str()).increment(1);
}

fn record_fallback(collection: Collection) {
    counter!(METRIC_STORE_FALLBACK, "collection" => collection.as_str()).increment(1);
}

/// Logs and counts a cache failure the caller has chosen to tolerate.
fn tolerate<T>(op: &'static str, result: Result<T, CacheError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
            warn!(op, error = %err, "cache operation failed, continuing without it");
            None
        }
    }
}

/// Entry point bundling the tag, topic and news services over one store and cache.
#[derive(Clone)]
pub struct Coordinator {
    tags: TagService,
    topics: TopicService,
    news: NewsService,
}

impl Coordinator {
    pub fn new<S>(store: Arc<S>, cache: Arc<dyn CacheStore>) -> Self
    where
        S: RelationalStore + 'static,
    {
        Self {
            tags: TagService::new(store.clone(), cache.clone()),
            topics: TopicService::new(store.clone(), cache.clone()),
            news: NewsService::new(store, cache),
        }
    }

    pub async fn add_tag(&self, label: &str) -> Result<TagRecord, CoordinatorError> {
        self.tags.add_tag(label).await
    }

    pub async fn edit_tag(&self, id: &str, label: &str) -> Result<TagRecord, CoordinatorError> {
        self.tags.edit_tag(id, label).await
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), CoordinatorError> {
        self.tags.delete_tag(id).await
    }

    pub async fn get_tags(&self) -> Result<Vec<TagRecord>, CoordinatorError> {
        self.tags.get_tags().await
    }

    pub async fn add_topic(
        &self,
        title: &str,
        headline: &str,
    ) -> Result<TopicRecord, CoordinatorError> {
        self.topics.add_topic(title, headline).await
    }

    pub async fn edit_topic(
        &self,
        id: &str,
        title: &str,
        headline: &str,
    ) -> Result<TopicRecord, CoordinatorError> {
        self.topics.edit_topic(id, title, headline).await
    }

    pub async fn delete_topic(&self, id: &str) -> Result<(), CoordinatorError> {
        self.topics.delete_topic(id).await
    }

    pub async fn get_topics(&self) -> Result<Vec<TopicRecord>, CoordinatorError> {
        self.topics.get_topics().await
    }

    pub async fn add_news(&self, draft: NewsDraft) -> Result<NewsRecord, CoordinatorError> {
        self.news.add_news(draft).await
    }

    pub async fn edit_news(
        &self,
        id: &str,
        draft: NewsDraft,
    ) -> Result<NewsRecord, CoordinatorError> {
        self.news.edit_news(id, draft).await
    }

    pub async fn delete_news(&self, id: &str) -> Result<(), CoordinatorError> {
        self.news.delete_news(id).await
    }

    pub async fn get_newses(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, CoordinatorError> {
        self.news.get_newses(filter).await
    }
}
