//! Database layer for xkcd-mirror
//!
//! Handles SQLite persistence for the document index and the sync history.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`documents`] - Full load and full rewrite of the index
//! - [`history`] - Completed synchronization runs

use crate::types::{Document, SyncRecord};
use crate::{Error, PersistenceError};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod documents;
mod history;
mod migrations;

/// Document record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct DocumentRow {
    /// Position in the saved sequence (0-based)
    pub position: i64,
    /// Document id
    pub id: i64,
    pub title: String,
    pub safe_title: String,
    pub day: String,
    pub month: String,
    pub year: String,
    pub transcript: Option<String>,
    pub image_ref: String,
    pub alt_text: String,
    pub origin_url: String,
    pub news: String,
    /// Image bytes, if downloaded
    pub payload: Option<Vec<u8>>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = u32::try_from(row.id)
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| {
                Error::Persistence(PersistenceError::QueryFailed(format!(
                    "row at position {} has invalid document id {}",
                    row.position, row.id
                )))
            })?;

        Ok(Document {
            id,
            title: row.title,
            safe_title: row.safe_title,
            day: row.day,
            month: row.month,
            year: row.year,
            transcript: row.transcript,
            image_ref: row.image_ref,
            alt_text: row.alt_text,
            origin_url: row.origin_url,
            news: row.news,
            payload: row.payload,
        })
    }
}

/// New sync run to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewSyncRun {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
    /// Latest document id at discovery time
    pub latest: u32,
    /// Fetch tasks scheduled
    pub scheduled: u64,
    /// Documents added
    pub fetched: u64,
    /// Documents that failed
    pub failed: u64,
}

/// Sync run record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SyncRunRow {
    pub id: i64,
    /// Unix timestamp
    pub started_at: i64,
    /// Unix timestamp
    pub completed_at: i64,
    pub latest: i64,
    pub scheduled: i64,
    pub fetched: i64,
    pub failed: i64,
}

impl From<SyncRunRow> for SyncRecord {
    fn from(row: SyncRunRow) -> Self {
        SyncRecord {
            id: row.id,
            started_at: DateTime::from_timestamp(row.started_at, 0).unwrap_or_default(),
            completed_at: DateTime::from_timestamp(row.completed_at, 0).unwrap_or_default(),
            latest: u32::try_from(row.latest).unwrap_or_default(),
            scheduled: row.scheduled.max(0) as u64,
            fetched: row.fetched.max(0) as u64,
            failed: row.failed.max(0) as u64,
        }
    }
}

/// Database handle for xkcd-mirror
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
