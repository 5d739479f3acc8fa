use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::repos::{CreateNewsParams, NewsRepo, UpdateNewsParams};
use crate::cache::{CacheStore, Collection};
use crate::domain::entities::NewsRecord;
use crate::domain::error::ensure_non_blank;
use crate::domain::filter::NewsFilter;

use super::{CoordinatorError, record_fallback, record_hit, record_miss, tolerate};

/// Caller-supplied content of a news article and its tag associations.
#[derive(Debug, Clone, Default)]
pub struct NewsDraft {
    pub topic_id: String,
    pub title: String,
    pub content: String,
    pub status: i32,
    pub tag_ids: Vec<String>,
}

#[derive(Clone)]
pub struct NewsService {
    store: Arc<dyn NewsRepo>,
    cache: Arc<dyn CacheStore>,
}

impl NewsService {
    pub fn new(store: Arc<dyn NewsRepo>, cache: Arc<dyn CacheStore>) -> Self {
        Self { store, cache }
    }

    /// Writes the article with its tags and marks the cached listing stale.
    ///
    /// If the tags cannot be written the article is not kept. The returned record
    /// carries the stored tag ids; labels are filled in by listings.
    #[instrument(skip(self, draft), fields(title = %draft.title, tags = draft.tag_ids.len()))]
    pub async fn add_news(&self, draft: NewsDraft) -> Result<NewsRecord, CoordinatorError> {
        ensure_non_blank(&draft.title, "title")?;
        let params = CreateNewsParams {
            topic_id: draft.topic_id,
            title: draft.title.trim().to_string(),
            content: draft.content,
            status: draft.status,
            tag_ids: draft.tag_ids,
        };
        let news = self.store.create_news_with_tags(&params).await?;
        self.cache.invalidate_newses().await?;
        Ok(news)
    }

    #[instrument(skip(self, draft), fields(title = %draft.title, tags = draft.tag_ids.len()))]
    pub async fn edit_news(
        &self,
        id: &str,
        draft: NewsDraft,
    ) -> Result<NewsRecord, CoordinatorError> {
        ensure_non_blank(&draft.title, "title")?;
        tolerate("unset_news", self.cache.unset_news(id).await);
        let params = UpdateNewsParams {
            id: id.to_string(),
            topic_id: draft.topic_id,
            title: draft.title.trim().to_string(),
            content: draft.content,
            status: draft.status,
            tag_ids: draft.tag_ids,
        };
        let news = self.store.update_news_with_tags(&params).await?;
        self.cache.invalidate_newses().await?;
        Ok(news)
    }

    #[instrument(skip(self))]
    pub async fn delete_news(&self, id: &str) -> Result<(), CoordinatorError> {
        tolerate("unset_news", self.cache.unset_news(id).await);
        self.store.remove_news(id).await?;
        self.cache.invalidate_newses().await?;
        Ok(())
    }

    /// Serves the cached listing when it is fresh and was built for `filter`;
    /// otherwise rebuilds it from the store.
    #[instrument(skip(self))]
    pub async fn get_newses(
        &self,
        filter: &NewsFilter,
    ) -> Result<Vec<NewsRecord>, CoordinatorError> {
        let key = filter.cache_key();
        let reload = tolerate("reload_required", self.cache.reload_required(&key).await)
            .unwrap_or(true);

        if !reload {
            if let Some(newses) = tolerate("get_newses", self.cache.get_newses().await) {
                record_hit(Collection::News);
                return Ok(newses);
            }
        }
        record_miss(Collection::News);
        self.rebuild(filter, &key).await
    }

    async fn rebuild(
        &self,
        filter: &NewsFilter,
        key: &str,
    ) -> Result<Vec<NewsRecord>, CoordinatorError> {
        debug!(filter = key, "rebuilding cached news listing");
        let slot_written = tolerate("set_filter", self.cache.set_filter(key).await).is_some();

        // A listing cached under a slot that does not name `key`, or left over from
        // another filter, must not be served as if it matched.
        let newses = match self.store.list_news(filter.scope()).await {
            Ok(newses) => newses,
            Err(err) => {
                self.mark_stale().await;
                return Err(err.into());
            }
        };
        record_fallback(Collection::News);

        if !slot_written {
            self.mark_stale().await;
            return Ok(newses);
        }
        if tolerate("reload_newses", self.cache.reload_newses(&newses).await).is_none() {
            self.mark_stale().await;
        }
        Ok(newses)
    }

    async fn mark_stale(&self) {
        tolerate("invalidate_newses", self.cache.invalidate_newses().await);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::application::repos::{RepoError, dedupe_tag_ids};
    use crate::cache::MemoryCache;
    use crate::domain::entities::NewsTagRecord;
    use crate::domain::filter::NewsScope;

    #[derive(Default)]
    struct StubNewsRepo {
        rows: Mutex<Vec<NewsRecord>>,
        list_calls: AtomicUsize,
        fail_list: AtomicBool,
    }

    impl StubNewsRepo {
        fn insert(&self, id: &str, topic_id: &str, status: i32, created_at: i64) {
            self.rows.lock().unwrap().push(NewsRecord {
                id: id.to_string(),
                topic_id: topic_id.to_string(),
                title: format!("title {id}"),
                content: String::new(),
                status,
                tag_ids: Vec::new(),
                tag_names: Vec::new(),
                created_at,
                updated_at: created_at,
            });
        }
    }

    #[async_trait]
    impl NewsRepo for StubNewsRepo {
        async fn create_news(&self, params: &CreateNewsParams) -> Result<NewsRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let news = NewsRecord {
                id: format!("news-{}", rows.len() + 1),
                topic_id: params.topic_id.clone(),
                title: params.title.clone(),
                content: params.content.clone(),
                status: params.status,
                tag_ids: Vec::new(),
                tag_names: Vec::new(),
                created_at: 100 + rows.len() as i64,
                updated_at: 100,
            };
            rows.push(news.clone());
            Ok(news)
        }

        async fn modify_news(&self, params: &UpdateNewsParams) -> Result<NewsRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|news| news.id == params.id)
                .ok_or(RepoError::NotFound)?;
            row.title = params.title.clone();
            row.status = params.status;
            Ok(row.clone())
        }

        async fn remove_news(&self, id: &str) -> Result<(), RepoError> {
            self.rows.lock().unwrap().retain(|news| news.id != id);
            Ok(())
        }

        async fn list_news(&self, scope: NewsScope<'_>) -> Result<Vec<NewsRecord>, RepoError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(RepoError::Timeout);
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|news| match scope {
                    NewsScope::All => true,
                    NewsScope::Status(status) => news.status == status,
                    NewsScope::Topic(topic_id) => news.topic_id == topic_id,
                    NewsScope::TopicAndStatus { topic_id, status } => {
                        news.topic_id == topic_id && news.status == status
                    }
                })
                .cloned()
                .collect())
        }

        async fn remove_news_tags(&self, _news_id: &str) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn replace_news_tags(
            &self,
            news_id: &str,
            tag_ids: &[String],
            _is_new: bool,
        ) -> Result<Vec<NewsTagRecord>, RepoError> {
            Ok(dedupe_tag_ids(tag_ids)
                .into_iter()
                .map(|tag_id| NewsTagRecord {
                    id: format!("{news_id}-{tag_id}"),
                    news_id: news_id.to_string(),
                    tag_id,
                    created_at: 0,
                    updated_at: 0,
                })
                .collect())
        }
    }

    fn setup() -> (Arc<StubNewsRepo>, Arc<MemoryCache>, NewsService) {
        let repo = Arc::new(StubNewsRepo::default());
        let cache = Arc::new(MemoryCache::new());
        let service = NewsService::new(repo.clone(), cache.clone());
        (repo, cache, service)
    }

    #[tokio::test]
    async fn second_read_with_same_filter_is_served_from_cache() {
        let (repo, _cache, news) = setup();
        repo.insert("n1", "t1", 1, 10);

        let filter = NewsFilter::all();
        let first = news.get_newses(&filter).await.unwrap();
        let second = news.get_newses(&filter).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changing_filter_rebuilds_listing() {
        let (repo, cache, news) = setup();
        repo.insert("n1", "t1", 1, 10);
        repo.insert("n2", "t2", 2, 20);

        news.get_newses(&NewsFilter::all()).await.unwrap();
        let scoped = news.get_newses(&NewsFilter::new("t2", 0)).await.unwrap();

        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, "n2");
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_filter().await.unwrap().as_deref(), Some("topic_id_t2"));
    }

    #[tokio::test]
    async fn writes_invalidate_the_listing() {
        let (repo, cache, news) = setup();
        news.get_newses(&NewsFilter::all()).await.unwrap();
        assert!(!cache.reload_required("none").await.unwrap());

        let created = news
            .add_news(NewsDraft {
                topic_id: "t1".into(),
                title: "Launch".into(),
                status: 1,
                tag_ids: vec!["g1".into(), "g1".into(), "g2".into()],
                ..NewsDraft::default()
            })
            .await
            .unwrap();
        assert_eq!(created.tag_ids, ["g1", "g2"]);
        assert!(cache.reload_required("none").await.unwrap());

        let listed = news.get_newses(&NewsFilter::all()).await.unwrap();
        assert_eq!(listed[0].id, created.id);
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 2);

        news.delete_news(&created.id).await.unwrap();
        assert!(cache.reload_required("none").await.unwrap());
    }

    #[tokio::test]
    async fn failed_rebuild_leaves_listing_stale() {
        let (repo, cache, news) = setup();
        repo.insert("n1", "t1", 1, 10);
        news.get_newses(&NewsFilter::all()).await.unwrap();

        repo.fail_list.store(true, Ordering::SeqCst);
        let err = news
            .get_newses(&NewsFilter::new("", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Store(RepoError::Timeout)));
        assert!(cache.reload_required("status_1").await.unwrap());
    }

    #[tokio::test]
    async fn edit_of_unknown_news_is_not_found() {
        let (_repo, _cache, news) = setup();
        let err = news
            .edit_news(
                "missing",
                NewsDraft {
                    title: "x".into(),
                    ..NewsDraft::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
