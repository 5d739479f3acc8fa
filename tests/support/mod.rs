#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use newsroom::application::repos::{
    CreateNewsParams, CreateTagParams, CreateTopicParams, NewsRepo, RepoError, TagsRepo,
    TopicsRepo, UpdateNewsParams, UpdateTagParams, UpdateTopicParams, dedupe_tag_ids,
};
use newsroom::cache::{CacheError, CacheStore, MemoryCache};
use newsroom::domain::entities::{
    NewsRecord, NewsTagRecord, TagRecord, TopicRecord, sort_newest_first,
};
use newsroom::domain::filter::{NewsScope, TOPIC_LISTING_STATUS};

#[derive(Default)]
struct Tables {
    tags: Vec<TagRecord>,
    topics: Vec<TopicRecord>,
    news: Vec<NewsRecord>,
    news_tags: Vec<NewsTagRecord>,
    next_id: u64,
}

impl Tables {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Relational store kept in memory. News writes use the trait's step-wise
/// defaults, so association failures exercise the compensating delete.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    clock: AtomicI64,
    pub list_tags_calls: AtomicUsize,
    pub list_topics_calls: AtomicUsize,
    pub list_news_calls: AtomicUsize,
    pub fail_tag_links: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock: AtomicI64::new(1_634_323_641),
            list_tags_calls: AtomicUsize::new(0),
            list_topics_calls: AtomicUsize::new(0),
            list_news_calls: AtomicUsize::new(0),
            fail_tag_links: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::unavailable("store offline"));
        }
        Ok(())
    }

    pub fn news_count(&self) -> usize {
        self.tables.lock().unwrap().news.len()
    }

    pub fn links_for(&self, news_id: &str) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .news_tags
            .iter()
            .filter(|link| link.news_id == news_id)
            .map(|link| link.tag_id.clone())
            .collect()
    }
}

#[async_trait]
impl TagsRepo for InMemoryStore {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let tag = TagRecord {
            id: tables.id("tag"),
            label: params.label,
            created_at: now,
            updated_at: now,
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    async fn modify_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let tag = tables
            .tags
            .iter_mut()
            .find(|tag| tag.id == params.id)
            .ok_or(RepoError::NotFound)?;
        tag.label = params.label;
        tag.updated_at = now;
        Ok(tag.clone())
    }

    async fn remove_tag(&self, id: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tags.len();
        tables.tags.retain(|tag| tag.id != id);
        RepoError::ensure_affected("delete tag", 1, (before - tables.tags.len()) as u64)
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        self.list_tags_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        let mut tags = self.tables.lock().unwrap().tags.clone();
        sort_newest_first(&mut tags);
        Ok(tags)
    }
}

#[async_trait]
impl TopicsRepo for InMemoryStore {
    async fn create_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let topic = TopicRecord {
            id: tables.id("topic"),
            title: params.title,
            headline: params.headline,
            created_at: now,
            updated_at: now,
        };
        tables.topics.push(topic.clone());
        Ok(topic)
    }

    async fn modify_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let topic = tables
            .topics
            .iter_mut()
            .find(|topic| topic.id == params.id)
            .ok_or(RepoError::NotFound)?;
        topic.title = params.title;
        topic.headline = params.headline;
        topic.updated_at = now;
        Ok(topic.clone())
    }

    async fn remove_topic(&self, id: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.topics.len();
        tables.topics.retain(|topic| topic.id != id);
        RepoError::ensure_affected("delete topic", 1, (before - tables.topics.len()) as u64)
    }

    async fn list_topics(&self) -> Result<Vec<TopicRecord>, RepoError> {
        self.list_topics_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        let mut topics = self.tables.lock().unwrap().topics.clone();
        sort_newest_first(&mut topics);
        Ok(topics)
    }
}

#[async_trait]
impl NewsRepo for InMemoryStore {
    async fn create_news(&self, params: &CreateNewsParams) -> Result<NewsRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let news = NewsRecord {
            id: tables.id("news"),
            topic_id: params.topic_id.clone(),
            title: params.title.clone(),
            content: params.content.clone(),
            status: params.status,
            tag_ids: Vec::new(),
            tag_names: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.news.push(news.clone());
        Ok(news)
    }

    async fn modify_news(&self, params: &UpdateNewsParams) -> Result<NewsRecord, RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let news = tables
            .news
            .iter_mut()
            .find(|news| news.id == params.id)
            .ok_or(RepoError::NotFound)?;
        news.topic_id = params.topic_id.clone();
        news.title = params.title.clone();
        news.content = params.content.clone();
        news.status = params.status;
        news.updated_at = now;
        Ok(news.clone())
    }

    async fn remove_news(&self, id: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.news.len();
        tables.news.retain(|news| news.id != id);
        let removed = (before - tables.news.len()) as u64;
        tables.news_tags.retain(|link| link.news_id != id);
        RepoError::ensure_affected("delete news", 1, removed)
    }

    async fn list_news(&self, scope: NewsScope<'_>) -> Result<Vec<NewsRecord>, RepoError> {
        self.list_news_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut newses: Vec<NewsRecord> = tables
            .news
            .iter()
            .filter(|news| match scope {
                NewsScope::All => true,
                NewsScope::Status(status) => news.status == status,
                NewsScope::Topic(topic_id) => {
                    news.topic_id == topic_id && news.status == TOPIC_LISTING_STATUS
                }
                NewsScope::TopicAndStatus { topic_id, status } => {
                    news.topic_id == topic_id && news.status == status
                }
            })
            .cloned()
            .map(|mut news| {
                for link in tables.news_tags.iter().filter(|link| link.news_id == news.id) {
                    let label = tables
                        .tags
                        .iter()
                        .find(|tag| tag.id == link.tag_id)
                        .map(|tag| tag.label.clone())
                        .unwrap_or_default();
                    news.tag_ids.push(link.tag_id.clone());
                    news.tag_names.push(label);
                }
                news
            })
            .collect();
        sort_newest_first(&mut newses);
        Ok(newses)
    }

    async fn remove_news_tags(&self, news_id: &str) -> Result<u64, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.news_tags.len();
        tables.news_tags.retain(|link| link.news_id != news_id);
        Ok((before - tables.news_tags.len()) as u64)
    }

    async fn replace_news_tags(
        &self,
        news_id: &str,
        tag_ids: &[String],
        is_new: bool,
    ) -> Result<Vec<NewsTagRecord>, RepoError> {
        if !is_new {
            self.remove_news_tags(news_id).await?;
        }
        let tag_ids = dedupe_tag_ids(tag_ids);
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        if self.fail_tag_links.load(Ordering::SeqCst) {
            return Err(RepoError::WriteFailed {
                operation: "insert news tags",
                expected: tag_ids.len() as u64,
                affected: 0,
            });
        }

        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let mut links = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            let link = NewsTagRecord {
                id: tables.id("news-tag"),
                news_id: news_id.to_string(),
                tag_id,
                created_at: now,
                updated_at: now,
            };
            tables.news_tags.push(link.clone());
            links.push(link);
        }
        Ok(links)
    }
}

/// Wraps [`MemoryCache`] with switches that make calls fail.
#[derive(Default)]
pub struct FlakyCache {
    inner: MemoryCache,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_set_filter: AtomicBool,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }

    fn read(&self) -> Result<(), CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("read refused".into()));
        }
        Ok(())
    }

    fn write(&self) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("write refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn set_tag(&self, tag: &TagRecord) -> Result<(), CacheError> {
        self.write()?;
        self.inner.set_tag(tag).await
    }

    async fn unset_tag(&self, id: &str) -> Result<(), CacheError> {
        self.write()?;
        self.inner.unset_tag(id).await
    }

    async fn get_tags(&self) -> Result<Vec<TagRecord>, CacheError> {
        self.read()?;
        self.inner.get_tags().await
    }

    async fn reload_tags(&self, tags: &[TagRecord]) -> Result<(), CacheError> {
        self.write()?;
        self.inner.reload_tags(tags).await
    }

    async fn set_topic(&self, topic: &TopicRecord) -> Result<(), CacheError> {
        self.write()?;
        self.inner.set_topic(topic).await
    }

    async fn unset_topic(&self, id: &str) -> Result<(), CacheError> {
        self.write()?;
        self.inner.unset_topic(id).await
    }

    async fn get_topics(&self) -> Result<Vec<TopicRecord>, CacheError> {
        self.read()?;
        self.inner.get_topics().await
    }

    async fn reload_topics(&self, topics: &[TopicRecord]) -> Result<(), CacheError> {
        self.write()?;
        self.inner.reload_topics(topics).await
    }

    async fn invalidate_newses(&self) -> Result<(), CacheError> {
        self.write()?;
        self.inner.invalidate_newses().await
    }

    async fn reload_required(&self, filter: &str) -> Result<bool, CacheError> {
        self.read()?;
        self.inner.reload_required(filter).await
    }

    async fn unset_news(&self, id: &str) -> Result<(), CacheError> {
        self.write()?;
        self.inner.unset_news(id).await
    }

    async fn get_newses(&self) -> Result<Vec<NewsRecord>, CacheError> {
        self.read()?;
        self.inner.get_newses().await
    }

    async fn reload_newses(&self, newses: &[NewsRecord]) -> Result<(), CacheError> {
        self.write()?;
        self.inner.reload_newses(newses).await
    }

    async fn get_filter(&self) -> Result<Option<String>, CacheError> {
        self.read()?;
        self.inner.get_filter().await
    }

    async fn set_filter(&self, filter: &str) -> Result<(), CacheError> {
        self.write()?;
        if self.fail_set_filter.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("filter slot refused".into()));
        }
        self.inner.set_filter(filter).await
    }
}
