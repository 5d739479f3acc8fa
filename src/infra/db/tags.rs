use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateTagParams, RepoError, TagsRepo, UpdateTagParams},
    domain::entities::TagRecord,
};

use super::{PostgresRepositories, edit_time, map_sqlx_error, new_id, unix_millis};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: String,
    tag: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            label: row.tag,
            created_at: unix_millis(row.created_at),
            updated_at: unix_millis(row.updated_at),
        }
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (id, tag, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, tag, created_at, updated_at
            "#,
        )
        .bind(new_id())
        .bind(&params.label)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn modify_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError> {
        let created_at = self.lookup_created_at("tags", &params.id).await?;
        let now = edit_time(created_at);

        let row = sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE tags
            SET tag = $2, created_at = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, tag, created_at, updated_at
            "#,
        )
        .bind(&params.id)
        .bind(&params.label)
        .bind(created_at)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(TagRecord::from).ok_or(RepoError::WriteFailed {
            operation: "update tag",
            expected: 1,
            affected: 0,
        })
    }

    async fn remove_tag(&self, id: &str) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        RepoError::ensure_affected("delete tag", 1, result.rows_affected())
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let _gate = self.read_guard().await;
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, tag, created_at, updated_at
            FROM tags
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }
}
