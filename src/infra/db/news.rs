use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateNewsParams, NewsRepo, RepoError, UpdateNewsParams},
    domain::{
        entities::{NewsRecord, NewsTagRecord},
        filter::{NewsScope, TOPIC_LISTING_STATUS},
    },
};

use super::{
    PostgresRepositories, edit_time, map_sqlx_error, new_id,
    news_tags::{delete_links, insert_links, load_labels},
    unix_millis,
};

const NEWS_COLUMNS: &str = "id, topic_id, title, content, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: String,
    topic_id: String,
    title: String,
    content: String,
    status: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<NewsRow> for NewsRecord {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            topic_id: row.topic_id,
            title: row.title,
            content: row.content,
            status: row.status,
            tag_ids: Vec::new(),
            tag_names: Vec::new(),
            created_at: unix_millis(row.created_at),
            updated_at: unix_millis(row.updated_at),
        }
    }
}

fn with_links(row: NewsRow, links: Vec<NewsTagRecord>) -> NewsRecord {
    let mut news = NewsRecord::from(row);
    news.tag_ids = links.into_iter().map(|link| link.tag_id).collect();
    news
}

async fn insert_news(
    conn: &mut PgConnection,
    params: &CreateNewsParams,
    now: OffsetDateTime,
) -> Result<NewsRow, RepoError> {
    let sql = format!(
        "INSERT INTO news ({NEWS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {NEWS_COLUMNS}"
    );
    sqlx::query_as::<_, NewsRow>(&sql)
        .bind(new_id())
        .bind(&params.topic_id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.status)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

async fn update_news(
    conn: &mut PgConnection,
    params: &UpdateNewsParams,
    created_at: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<NewsRow, RepoError> {
    let sql = format!(
        "UPDATE news \
         SET topic_id = $2, title = $3, content = $4, status = $5, created_at = $6, updated_at = $7 \
         WHERE id = $1 \
         RETURNING {NEWS_COLUMNS}"
    );
    sqlx::query_as::<_, NewsRow>(&sql)
        .bind(&params.id)
        .bind(&params.topic_id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.status)
        .bind(created_at)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::WriteFailed {
            operation: "update news",
            expected: 1,
            affected: 0,
        })
}

fn push_scope<'q>(qb: &mut QueryBuilder<'q, Postgres>, scope: NewsScope<'q>) {
    match scope {
        NewsScope::All => {}
        NewsScope::Status(status) => {
            qb.push(" WHERE status = ");
            qb.push_bind(status);
        }
        NewsScope::Topic(topic_id) => {
            qb.push(" WHERE topic_id = ");
            qb.push_bind(topic_id);
            qb.push(" AND status = ");
            qb.push_bind(TOPIC_LISTING_STATUS);
        }
        NewsScope::TopicAndStatus { topic_id, status } => {
            qb.push(" WHERE topic_id = ");
            qb.push_bind(topic_id);
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
    }
}

#[async_trait]
impl NewsRepo for PostgresRepositories {
    async fn create_news(&self, params: &CreateNewsParams) -> Result<NewsRecord, RepoError> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;
        let row = insert_news(&mut conn, params, OffsetDateTime::now_utc()).await?;
        Ok(row.into())
    }

    async fn modify_news(&self, params: &UpdateNewsParams) -> Result<NewsRecord, RepoError> {
        let created_at = self.lookup_created_at("news", &params.id).await?;
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;
        let row = update_news(&mut conn, params, created_at, edit_time(created_at)).await?;
        Ok(row.into())
    }

    async fn remove_news(&self, id: &str) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        RepoError::ensure_affected("delete news", 1, result.rows_affected())
    }

    async fn list_news(&self, scope: NewsScope<'_>) -> Result<Vec<NewsRecord>, RepoError> {
        let _gate = self.read_guard().await;
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {NEWS_COLUMNS} FROM news"));
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY created_at DESC, id ASC");

        let rows = qb
            .build_query_as::<NewsRow>()
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        let mut newses = Vec::with_capacity(rows.len());
        for row in rows {
            let (tag_ids, tag_names) = load_labels(&mut conn, &row.id).await?;
            let mut news = NewsRecord::from(row);
            news.tag_ids = tag_ids;
            news.tag_names = tag_names;
            newses.push(news);
        }
        Ok(newses)
    }

    async fn remove_news_tags(&self, news_id: &str) -> Result<u64, RepoError> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;
        delete_links(&mut conn, news_id).await
    }

    async fn replace_news_tags(
        &self,
        news_id: &str,
        tag_ids: &[String],
        is_new: bool,
    ) -> Result<Vec<NewsTagRecord>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        if !is_new {
            delete_links(&mut tx, news_id).await?;
        }
        let links = insert_links(&mut tx, news_id, tag_ids, OffsetDateTime::now_utc()).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(links)
    }

    /// Writes the row and its links in one transaction, so a failed link write
    /// leaves nothing behind.
    async fn create_news_with_tags(
        &self,
        params: &CreateNewsParams,
    ) -> Result<NewsRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let row = insert_news(&mut tx, params, now).await?;
        let links = insert_links(&mut tx, &row.id, &params.tag_ids, now).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(with_links(row, links))
    }

    async fn update_news_with_tags(
        &self,
        params: &UpdateNewsParams,
    ) -> Result<NewsRecord, RepoError> {
        let created_at = self.lookup_created_at("news", &params.id).await?;
        let now = edit_time(created_at);
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let row = update_news(&mut tx, params, created_at, now).await?;
        delete_links(&mut tx, &row.id).await?;
        let links = insert_links(&mut tx, &row.id, &params.tag_ids, now).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(with_links(row, links))
    }
}
