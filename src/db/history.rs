//! Sync history operations.

use crate::types::SyncRecord;
use crate::{Error, Result};

use super::{Database, NewSyncRun, SyncRunRow};

impl Database {
    /// Record a completed synchronization run
    pub async fn insert_sync_run(&self, run: &NewSyncRun) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sync_runs (
                started_at, completed_at, latest, scheduled, fetched, failed
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.started_at.timestamp())
        .bind(run.completed_at.timestamp())
        .bind(i64::from(run.latest))
        .bind(run.scheduled as i64)
        .bind(run.fetched as i64)
        .bind(run.failed as i64)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent runs, newest first
    pub async fn recent_sync_runs(&self, limit: usize) -> Result<Vec<SyncRecord>> {
        let rows = sqlx::query_as::<_, SyncRunRow>(
            r#"
            SELECT id, started_at, completed_at, latest, scheduled, fetched, failed
            FROM sync_runs
            ORDER BY completed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows.into_iter().map(SyncRecord::from).collect())
    }

    /// The newest recorded run
    pub async fn last_sync(&self) -> Result<Option<SyncRecord>> {
        Ok(self.recent_sync_runs(1).await?.into_iter().next())
    }
}
