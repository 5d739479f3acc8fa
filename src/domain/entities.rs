//! Domain entities mirrored from persistent storage.
//!
//! Timestamps are unix milliseconds. Identifiers are opaque strings assigned by the store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    #[serde(rename = "tag")]
    pub label: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: String,
    pub title: String,
    pub headline: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A news article together with the tags it is associated with.
///
/// `tag_ids` and `tag_names` are derived from the association table and are
/// index-aligned; they are never stored on the news row itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub content: String,
    pub status: i32,
    #[serde(rename = "news_tag_ids", default)]
    pub tag_ids: Vec<String>,
    #[serde(rename = "news_tag_names", default)]
    pub tag_names: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsTagRecord {
    pub id: String,
    pub news_id: String,
    pub tag_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Records that can live in a cached collection keyed by id.
pub trait Cached {
    fn cache_id(&self) -> &str;
    fn created_at(&self) -> i64;
}

impl Cached for TagRecord {
    fn cache_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl Cached for TopicRecord {
    fn cache_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl Cached for NewsRecord {
    fn cache_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// Newest first, ties broken by id so listings are stable.
pub fn sort_newest_first<T: Cached>(records: &mut [T]) {
    records.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.cache_id().cmp(b.cache_id()))
    });
}
