//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::domain::entities::{NewsRecord, NewsTagRecord, TagRecord, TopicRecord};
use crate::domain::filter::NewsScope;

pub(crate) const METRIC_NEWS_COMPENSATION: &str = "newsroom_news_compensation_total";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("{operation} affected {affected} rows, expected {expected}")]
    WriteFailed {
        operation: &'static str,
        expected: u64,
        affected: u64,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// Fails with `WriteFailed` unless a statement touched exactly `expected` rows.
    /// Zero affected rows is always a failure.
    pub fn ensure_affected(
        operation: &'static str,
        expected: u64,
        affected: u64,
    ) -> Result<(), RepoError> {
        if affected == 0 || affected != expected {
            return Err(Self::WriteFailed {
                operation,
                expected,
                affected,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CreateTagParams {
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTagParams {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct CreateTopicParams {
    pub title: String,
    pub headline: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTopicParams {
    pub id: String,
    pub title: String,
    pub headline: String,
}

#[derive(Debug, Clone)]
pub struct CreateNewsParams {
    pub topic_id: String,
    pub title: String,
    pub content: String,
    pub status: i32,
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateNewsParams {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub content: String,
    pub status: i32,
    pub tag_ids: Vec<String>,
}

/// Collapses repeated tag ids, keeping the first occurrence of each.
pub fn dedupe_tag_ids(tag_ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(tag_ids.len());
    tag_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError>;

    /// Preserves the stored `created_at`; fails with `NotFound` when the id is unknown.
    async fn modify_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError>;

    /// Deleting an unknown id is a `WriteFailed` error, not a no-op.
    async fn remove_tag(&self, id: &str) -> Result<(), RepoError>;

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;
}

#[async_trait]
pub trait TopicsRepo: Send + Sync {
    async fn create_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError>;

    async fn modify_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError>;

    async fn remove_topic(&self, id: &str) -> Result<(), RepoError>;

    async fn list_topics(&self) -> Result<Vec<TopicRecord>, RepoError>;
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    /// Inserts the news row only; the returned record has no tags.
    async fn create_news(&self, params: &CreateNewsParams) -> Result<NewsRecord, RepoError>;

    async fn modify_news(&self, params: &UpdateNewsParams) -> Result<NewsRecord, RepoError>;

    async fn remove_news(&self, id: &str) -> Result<(), RepoError>;

    /// Newest first, each row enriched with its tag ids and labels.
    async fn list_news(&self, scope: NewsScope<'_>) -> Result<Vec<NewsRecord>, RepoError>;

    /// Returns the number of association rows removed; zero is not an error.
    async fn remove_news_tags(&self, news_id: &str) -> Result<u64, RepoError>;

    /// Makes the association set for `news_id` equal `tag_ids`, returning the rows
    /// written in `tag_ids` order.
    ///
    /// Existing rows are removed first unless `is_new`. Repeated ids are written
    /// once. An empty list inserts nothing.
    async fn replace_news_tags(
        &self,
        news_id: &str,
        tag_ids: &[String],
        is_new: bool,
    ) -> Result<Vec<NewsTagRecord>, RepoError>;

    /// Writes a news row and its associations. The returned record carries the
    /// stored tag ids; labels are resolved when listing.
    ///
    /// The default runs the two steps separately and deletes the news row again if
    /// the association write fails; the association error is what the caller sees.
    /// Stores with transactions should override this.
    async fn create_news_with_tags(
        &self,
        params: &CreateNewsParams,
    ) -> Result<NewsRecord, RepoError> {
        let mut news = self.create_news(params).await?;
        match self.replace_news_tags(&news.id, &params.tag_ids, true).await {
            Ok(links) => {
                news.tag_ids = links.into_iter().map(|link| link.tag_id).collect();
                Ok(news)
            }
            Err(err) => {
                counter!(METRIC_NEWS_COMPENSATION).increment(1);
                if let Err(cleanup) = self.remove_news(&news.id).await {
                    warn!(
                        news_id = %news.id,
                        error = %cleanup,
                        "compensating delete after failed tag write did not succeed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Updates a news row and replaces its associations.
    async fn update_news_with_tags(
        &self,
        params: &UpdateNewsParams,
    ) -> Result<NewsRecord, RepoError> {
        let mut news = self.modify_news(params).await?;
        let links = self
            .replace_news_tags(&news.id, &params.tag_ids, false)
            .await?;
        news.tag_ids = links.into_iter().map(|link| link.tag_id).collect();
        Ok(news)
    }
}

/// Everything the coordinator needs from the store of record.
pub trait RelationalStore: TagsRepo + TopicsRepo + NewsRepo {}

impl<T> RelationalStore for T where T: TagsRepo + TopicsRepo + NewsRepo {}
