use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateTopicParams, RepoError, TopicsRepo, UpdateTopicParams},
    domain::entities::TopicRecord,
};

use super::{PostgresRepositories, edit_time, map_sqlx_error, new_id, unix_millis};

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: String,
    title: String,
    headline: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TopicRow> for TopicRecord {
    fn from(row: TopicRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            headline: row.headline,
            created_at: unix_millis(row.created_at),
            updated_at: unix_millis(row.updated_at),
        }
    }
}

#[async_trait]
impl TopicsRepo for PostgresRepositories {
    async fn create_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            INSERT INTO topics (id, title, headline, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, title, headline, created_at, updated_at
            "#,
        )
        .bind(new_id())
        .bind(&params.title)
        .bind(&params.headline)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn modify_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError> {
        let created_at = self.lookup_created_at("topics", &params.id).await?;
        let now = edit_time(created_at);

        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            UPDATE topics
            SET title = $2, headline = $3, created_at = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, title, headline, created_at, updated_at
            "#,
        )
        .bind(&params.id)
        .bind(&params.title)
        .bind(&params.headline)
        .bind(created_at)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(TopicRecord::from).ok_or(RepoError::WriteFailed {
            operation: "update topic",
            expected: 1,
            affected: 0,
        })
    }

    async fn remove_topic(&self, id: &str) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        RepoError::ensure_affected("delete topic", 1, result.rows_affected())
    }

    async fn list_topics(&self) -> Result<Vec<TopicRecord>, RepoError> {
        let _gate = self.read_guard().await;
        let rows = sqlx::query_as::<_, TopicRow>(
            r#"
            SELECT id, title, headline, created_at, updated_at
            FROM topics
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TopicRecord::from).collect())
    }
}
