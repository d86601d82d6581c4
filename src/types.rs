//! Core types for xkcd-mirror

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Identifier of a document within the series (1-based, `0` = unresolved)
pub type DocumentId = u32;

/// One item of the mirrored series
///
/// Date fields are kept exactly as published. `payload` holds the image bytes
/// once the secondary fetch succeeded and is never part of the JSON form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Position in the series
    pub id: DocumentId,
    /// Title
    pub title: String,
    /// Title without markup
    pub safe_title: String,
    /// Day of publication as published
    pub day: String,
    /// Month of publication as published
    pub month: String,
    /// Year of publication as published
    pub year: String,
    /// Transcript, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// URI of the image
    pub image_ref: String,
    /// Alt (hover) text
    pub alt_text: String,
    /// Link the comic points to, if any
    pub origin_url: String,
    /// News blurb published alongside the comic
    pub news: String,
    /// Image bytes, when downloaded
    #[serde(skip)]
    pub payload: Option<Vec<u8>>,
}

impl Document {
    /// Whether the document has a real identifier
    pub fn is_resolved(&self) -> bool {
        self.id != 0
    }

    /// Whether the image bytes were downloaded
    pub fn has_payload(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Publication date, when the published fields form a valid date
    pub fn published(&self) -> Option<NaiveDate> {
        let year = self.year.trim().parse().ok()?;
        let month = self.month.trim().parse().ok()?;
        let day = self.day.trim().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Content type of the payload, guessed from the image reference
    pub fn payload_content_type(&self) -> &'static str {
        let path = self
            .image_ref
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// Compact listing entry for a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentSummary {
    /// Position in the series
    pub id: DocumentId,
    /// Title
    pub title: String,
    /// Year as published
    pub year: String,
    /// Month as published
    pub month: String,
    /// Day as published
    pub day: String,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            year: doc.year.clone(),
            month: doc.month.clone(),
            day: doc.day.clone(),
        }
    }
}

/// Synchronizer state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Not running
    #[default]
    Idle,
    /// Resolving the latest document
    Discovering,
    /// Scheduling fetch tasks for missing documents
    Fetching,
    /// Waiting for outstanding tasks and flushing results into the collection
    Draining,
    /// Run finished
    Done,
}

/// Events emitted by the synchronizer
///
/// Delivered over a broadcast channel; a slow subscriber may miss events but never
/// slows a run down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Run started, resolving the latest document
    Discovering,

    /// Latest document resolved
    Discovered {
        /// Id of the latest document (upper bound of the run)
        latest: DocumentId,
        /// Number of documents that will be fetched
        missing: usize,
    },

    /// Periodic progress report
    Progress {
        /// Documents currently in the collection
        indexed: usize,
        /// Upper bound of the run
        upper_bound: DocumentId,
        /// `indexed / upper_bound * 100`
        percent: f32,
    },

    /// A document was fetched and handed to the collection writer
    Fetched {
        /// Document id
        id: DocumentId,
        /// Whether the image was downloaded too
        has_payload: bool,
    },

    /// A document could not be fetched this run
    FetchFailed {
        /// Document id
        id: DocumentId,
        /// Error message
        error: String,
    },

    /// Run finished
    Complete {
        /// Documents added to the collection
        fetched: usize,
        /// Documents that failed
        failed: usize,
        /// Wall-clock duration in milliseconds
        elapsed_ms: u64,
    },
}

/// Outcome of one synchronization run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Id of the latest document at discovery time
    pub latest: DocumentId,
    /// Whether the latest document was new to the index
    pub latest_added: bool,
    /// Number of fetch tasks scheduled
    pub scheduled: usize,
    /// Documents added by fetch tasks (excluding the latest)
    pub fetched: usize,
    /// Ids whose fetch failed, ascending
    pub failed: Vec<DocumentId>,
    /// Added documents without image bytes
    pub missing_payloads: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl SyncReport {
    /// Total documents added to the collection by this run
    pub fn added(&self) -> usize {
        self.fetched + usize::from(self.latest_added)
    }
}

/// A completed synchronization as recorded in the index database
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncRecord {
    /// Row id
    pub id: i64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
    /// Latest document id at the time
    pub latest: DocumentId,
    /// Tasks scheduled
    pub scheduled: u64,
    /// Documents added
    pub fetched: u64,
    /// Documents that failed
    pub failed: u64,
}

/// Summary of the local index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IndexStats {
    /// Documents in the index
    pub total: usize,
    /// Highest id in the index
    pub latest: Option<DocumentId>,
    /// Ids in `1..=latest` that are not indexed
    pub missing: Vec<DocumentId>,
    /// Indexed documents without an image
    pub without_payload: usize,
    /// Earliest publication date
    pub first_published: Option<NaiveDate>,
    /// Latest publication date
    pub last_published: Option<NaiveDate>,
    /// Most recent recorded synchronization
    pub last_sync: Option<SyncRecord>,
}
