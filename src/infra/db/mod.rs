//! Postgres-backed repository implementations.

mod news;
mod news_tags;
mod tags;
mod topics;
mod util;

pub use util::map_sqlx_error;

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    query, query_scalar,
    postgres::{PgPool, PgPoolOptions},
};
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};

use crate::application::repos::RepoError;

/// How concurrent reads share the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadDiscipline {
    /// Reads run concurrently on pooled connections.
    #[default]
    Pooled,
    /// Reads are admitted one at a time across the process.
    Serialized,
}

impl FromStr for ReadDiscipline {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pooled" => Ok(Self::Pooled),
            "serialized" => Ok(Self::Serialized),
            other => Err(format!(
                "unknown read discipline `{other}` (expected `pooled` or `serialized`)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    read_gate: Option<Arc<Mutex<()>>>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool, discipline: ReadDiscipline) -> Self {
        let read_gate = match discipline {
            ReadDiscipline::Pooled => None,
            ReadDiscipline::Serialized => Some(Arc::new(Mutex::new(()))),
        };
        Self {
            pool: Arc::new(pool),
            read_gate,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Held for the duration of a read when reads are serialized.
    async fn read_guard(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.read_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        }
    }

    /// Looks up the creation time of a row so updates can carry it over.
    async fn lookup_created_at(
        &self,
        table: &'static str,
        id: &str,
    ) -> Result<OffsetDateTime, RepoError> {
        let _gate = self.read_guard().await;
        let sql = format!("SELECT created_at FROM {table} WHERE id = $1");
        query_scalar::<_, OffsetDateTime>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Record timestamps are unix milliseconds.
pub(crate) fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Update time for a row created at `created_at`: now, but never within the same
/// millisecond as the creation.
pub(crate) fn edit_time(created_at: OffsetDateTime) -> OffsetDateTime {
    let floor = created_at + time::Duration::milliseconds(1);
    OffsetDateTime::now_utc().max(floor)
}
