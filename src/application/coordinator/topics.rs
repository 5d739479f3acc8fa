use std::sync::Arc;

use tracing::instrument;

use crate::application::repos::{CreateTopicParams, TopicsRepo, UpdateTopicParams};
use crate::cache::{CacheStore, Collection};
use crate::domain::entities::TopicRecord;
use crate::domain::error::ensure_non_blank;

use super::{CoordinatorError, record_fallback, record_hit, record_miss, tolerate};

#[derive(Clone)]
pub struct TopicService {
    store: Arc<dyn TopicsRepo>,
    cache: Arc<dyn CacheStore>,
}

impl TopicService {
    pub fn new(store: Arc<dyn TopicsRepo>, cache: Arc<dyn CacheStore>) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self))]
    pub async fn add_topic(
        &self,
        title: &str,
        headline: &str,
    ) -> Result<TopicRecord, CoordinatorError> {
        ensure_non_blank(title, "title")?;
        let topic = self
            .store
            .create_topic(CreateTopicParams {
                title: title.trim().to_string(),
                headline: headline.to_string(),
            })
            .await?;
        self.cache.set_topic(&topic).await?;
        Ok(topic)
    }

    /// Same ordering as tag edits: evict, update, re-add.
    #[instrument(skip(self))]
    pub async fn edit_topic(
        &self,
        id: &str,
        title: &str,
        headline: &str,
    ) -> Result<TopicRecord, CoordinatorError> {
        ensure_non_blank(title, "title")?;
        self.cache.unset_topic(id).await?;
        let topic = self
            .store
            .modify_topic(UpdateTopicParams {
                id: id.to_string(),
                title: title.trim().to_string(),
                headline: headline.to_string(),
            })
            .await?;
        self.cache.set_topic(&topic).await?;
        Ok(topic)
    }

    #[instrument(skip(self))]
    pub async fn delete_topic(&self, id: &str) -> Result<(), CoordinatorError> {
        self.store.remove_topic(id).await?;
        self.cache.unset_topic(id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_topics(&self) -> Result<Vec<TopicRecord>, CoordinatorError> {
        if let Some(topics) = tolerate("get_topics", self.cache.get_topics().await) {
            if !topics.is_empty() {
                record_hit(Collection::Topics);
                return Ok(topics);
            }
        }
        record_miss(Collection::Topics);

        let topics = self.store.list_topics().await?;
        record_fallback(Collection::Topics);
        if !topics.is_empty() {
            tolerate("reload_topics", self.cache.reload_topics(&topics).await);
        }
        Ok(topics)
    }
}
