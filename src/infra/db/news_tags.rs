//! Association rows between news and tags.
//!
//! These helpers take a bare connection so the same statements run on a pooled
//! connection or inside a transaction.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, dedupe_tag_ids},
    domain::entities::NewsTagRecord,
};

use super::{map_sqlx_error, new_id, unix_millis};

#[derive(sqlx::FromRow)]
struct NewsTagRow {
    id: String,
    news_id: String,
    tag_id: String,
    position: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<NewsTagRow> for NewsTagRecord {
    fn from(row: NewsTagRow) -> Self {
        Self {
            id: row.id,
            news_id: row.news_id,
            tag_id: row.tag_id,
            created_at: unix_millis(row.created_at),
            updated_at: unix_millis(row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagLabelRow {
    tag_id: String,
    tag: String,
}

pub(super) async fn delete_links(conn: &mut PgConnection, news_id: &str) -> Result<u64, RepoError> {
    let result = sqlx::query("DELETE FROM news_tags WHERE news_id = $1")
        .bind(news_id)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(result.rows_affected())
}

/// Inserts one row per distinct tag id in a single statement.
pub(super) async fn insert_links(
    conn: &mut PgConnection,
    news_id: &str,
    tag_ids: &[String],
    now: OffsetDateTime,
) -> Result<Vec<NewsTagRecord>, RepoError> {
    let tag_ids = dedupe_tag_ids(tag_ids);
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO news_tags (id, news_id, tag_id, position, created_at, updated_at) ",
    );
    qb.push_values(tag_ids.iter().enumerate(), |mut row, (position, tag_id)| {
        row.push_bind(new_id())
            .push_bind(news_id)
            .push_bind(tag_id)
            .push_bind(position as i32)
            .push_bind(now)
            .push_bind(now);
    });
    qb.push(" RETURNING id, news_id, tag_id, position, created_at, updated_at");

    let mut rows = qb
        .build_query_as::<NewsTagRow>()
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    RepoError::ensure_affected("insert news tags", tag_ids.len() as u64, rows.len() as u64)?;

    rows.sort_by_key(|row| row.position);
    Ok(rows.into_iter().map(NewsTagRecord::from).collect())
}

/// Tag ids and labels for one news row, index-aligned. A tag that no longer
/// exists contributes an empty label.
pub(super) async fn load_labels(
    conn: &mut PgConnection,
    news_id: &str,
) -> Result<(Vec<String>, Vec<String>), RepoError> {
    let rows = sqlx::query_as::<_, TagLabelRow>(
        r#"
        SELECT nt.tag_id, COALESCE(t.tag, '') AS tag
        FROM news_tags nt
        LEFT JOIN tags t ON t.id = nt.tag_id
        WHERE nt.news_id = $1
        ORDER BY nt.position ASC, nt.id ASC
        "#,
    )
    .bind(news_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(|row| (row.tag_id, row.tag)).unzip())
}
