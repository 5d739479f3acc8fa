//! News listing filters and the cache key that identifies them.

use serde::Serialize;

/// Status code the coordinator treats as "no status filter".
pub const NO_STATUS: i32 = 0;

/// Status applied by the topic-only read path.
pub const TOPIC_LISTING_STATUS: i32 = 1;

/// Caller-supplied news listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewsFilter {
    pub topic_id: Option<String>,
    pub status: i32,
}

/// One of the four store read paths a filter resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsScope<'a> {
    All,
    Status(i32),
    Topic(&'a str),
    TopicAndStatus { topic_id: &'a str, status: i32 },
}

impl NewsFilter {
    /// Builds a filter, treating an empty topic id as unset.
    pub fn new(topic_id: impl Into<String>, status: i32) -> Self {
        let topic_id = topic_id.into();
        Self {
            topic_id: (!topic_id.is_empty()).then_some(topic_id),
            status,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> NewsScope<'_> {
        let topic_id = self.topic_id.as_deref().filter(|id| !id.is_empty());
        match (topic_id, self.status != NO_STATUS) {
            (Some(topic_id), true) => NewsScope::TopicAndStatus {
                topic_id,
                status: self.status,
            },
            (None, true) => NewsScope::Status(self.status),
            (Some(topic_id), false) => NewsScope::Topic(topic_id),
            (None, false) => NewsScope::All,
        }
    }

    /// Key stored in the cache's current-filter slot.
    pub fn cache_key(&self) -> String {
        self.scope().cache_key()
    }
}

impl NewsScope<'_> {
    pub fn cache_key(&self) -> String {
        match self {
            NewsScope::TopicAndStatus { topic_id, status } => {
                format!("topic_id_status_{topic_id}_{status}")
            }
            NewsScope::Status(status) => format!("status_{status}"),
            NewsScope::Topic(topic_id) => format!("topic_id_{topic_id}"),
            NewsScope::All => "none".to_string(),
        }
    }
}
