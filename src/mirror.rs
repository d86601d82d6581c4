//! Top-level mirror handle
//!
//! [`Mirror`] owns the index database, the in-memory [`Collection`] and the
//! [`Synchronizer`], and runs the load → sync → sort → save cycle.

use crate::collection::Collection;
use crate::config::Config;
use crate::db::{Database, NewSyncRun};
use crate::error::Result;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::synchronizer::Synchronizer;
use crate::types::{DocumentSummary, Event, IndexStats, SyncPhase, SyncReport};
use chrono::Utc;
use std::sync::Arc;

/// Main entry point for mirroring the series
///
/// Cheap to clone; clones share the same index, database and synchronizer.
#[derive(Clone)]
pub struct Mirror {
    /// Index database
    pub(crate) db: Arc<Database>,
    /// In-memory index
    pub(crate) collection: Arc<Collection>,
    /// Synchronization engine
    synchronizer: Arc<Synchronizer>,
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Serializes sync runs on this handle
    sync_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Mirror {
    /// Create a mirror that fetches over HTTP
    ///
    /// - Validates the configuration
    /// - Opens/creates the index database and runs migrations
    ///
    /// The index is not loaded yet; call [`Mirror::load_index`].
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::from_config(&config.source)?);
        Self::with_fetcher(config, fetcher).await
    }

    /// Create a mirror over a custom [`Fetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.index_path()).await?;
        let synchronizer = Synchronizer::new(fetcher, config.sync.clone());

        tracing::debug!(
            index = %config.persistence.index_path().display(),
            source = %config.source.base_url,
            concurrency = config.sync.concurrency,
            "Mirror initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            collection: Arc::new(Collection::new()),
            synchronizer: Arc::new(synchronizer),
            config: Arc::new(config),
            sync_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Load the persisted index into memory
    ///
    /// A failing load is logged and leaves the collection empty; the next sync then
    /// rebuilds the index from scratch. Returns the number of documents in memory.
    pub async fn load_index(&self) -> usize {
        match self.db.load_documents().await {
            Ok(documents) => {
                let count = documents.len();
                if self.collection.load(documents) {
                    tracing::info!(count, "Index loaded");
                } else {
                    tracing::debug!("Collection already populated, skipping index load");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load index, starting empty");
            }
        }
        self.collection.len()
    }

    /// Synchronize, then sort and persist the index
    ///
    /// # Errors
    ///
    /// Fails when the latest document cannot be resolved (nothing changes) or when
    /// the index cannot be saved afterwards.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _guard = self.sync_lock.lock().await;
        let started_at = Utc::now();

        let report = self
            .synchronizer
            .run(Arc::clone(&self.collection))
            .await?;

        self.collection.sort();
        let saved = self.db.save_documents(&self.collection.get_all()).await?;
        tracing::info!(saved, "Index persisted");

        let run = NewSyncRun {
            started_at,
            completed_at: Utc::now(),
            latest: report.latest,
            scheduled: report.scheduled as u64,
            fetched: report.added() as u64,
            failed: report.failed.len() as u64,
        };
        if let Err(e) = self.db.insert_sync_run(&run).await {
            tracing::warn!(error = %e, "Failed to record sync run");
        }

        Ok(report)
    }

    /// Summary of the in-memory index plus the last recorded sync
    pub async fn stats(&self) -> Result<IndexStats> {
        let last_sync = self.db.last_sync().await?;
        let latest = self.collection.latest();
        let missing = latest
            .map(|latest| self.collection.missing(latest))
            .unwrap_or_default();

        let (without_payload, first_published, last_published) =
            self.collection.with_documents(|documents| {
                let without_payload = documents.iter().filter(|d| !d.has_payload()).count();
                let dates = documents.iter().filter_map(|d| d.published());
                let first = dates.clone().min();
                let last = dates.max();
                (without_payload, first, last)
            });

        Ok(IndexStats {
            total: self.collection.len(),
            latest,
            missing,
            without_payload,
            first_published,
            last_published,
            last_sync,
        })
    }

    /// `(id, year, month, day)` of every document in collection order
    pub fn dump(&self) -> Vec<DocumentSummary> {
        self.collection
            .with_documents(|documents| documents.iter().map(DocumentSummary::from).collect())
    }

    /// Subscribe to synchronizer events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently; one that falls behind by more than 1000 events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.synchronizer.subscribe()
    }

    /// Current synchronizer phase
    pub fn phase(&self) -> SyncPhase {
        self.synchronizer.phase()
    }

    /// The in-memory index
    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    /// Get the current configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Close the database pool
    pub async fn shutdown(&self) {
        self.db.pool().close().await;
        tracing::debug!("Mirror shut down");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_helpers::{StaticFetcher, create_mirror_in, test_config};
    use tempfile::{TempDir, tempdir};

    async fn mirror(dir: &TempDir, latest: Option<u32>, refuse: Option<u32>) -> Mirror {
        create_mirror_in(dir, latest, refuse).await
    }

    #[tokio::test]
    async fn sync_sorts_and_persists() {
        let dir = tempdir().unwrap();
        let m = mirror(&dir, Some(8), Some(4)).await;
        assert_eq!(m.load_index().await, 0);

        let report = m.sync().await.unwrap();
        assert_eq!(report.added(), 7);
        assert_eq!(report.failed, vec![4]);
        assert!(m.collection().is_sorted());

        let saved: Vec<u32> = m.db.load_documents().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(saved, vec![1, 2, 3, 5, 6, 7, 8]);

        let last = m.db.last_sync().await.unwrap().unwrap();
        assert_eq!(last.latest, 8);
        assert_eq!(last.fetched, 7);
        assert_eq!(last.failed, 1);
    }

    #[tokio::test]
    async fn second_process_resumes_from_saved_index() {
        let dir = tempdir().unwrap();
        {
            let m = mirror(&dir, Some(5), Some(2)).await;
            m.load_index().await;
            m.sync().await.unwrap();
            m.shutdown().await;
        }

        let m = mirror(&dir, Some(6), None).await;
        assert_eq!(m.load_index().await, 4);
        assert!(m.collection().is_sorted());

        let report = m.sync().await.unwrap();
        assert_eq!(report.scheduled, 1, "only the gap below latest is fetched");
        assert!(report.latest_added);
        assert_eq!(m.collection().ids(), (1..=6).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failed_discovery_keeps_saved_index() {
        let dir = tempdir().unwrap();
        {
            let m = mirror(&dir, Some(3), None).await;
            m.sync().await.unwrap();
            m.shutdown().await;
        }

        let m = mirror(&dir, None, None).await;
        m.load_index().await;
        assert!(m.sync().await.is_err());
        assert_eq!(m.db.count_documents().await.unwrap(), 3);
        assert_eq!(m.phase(), SyncPhase::Idle);
    }

    #[tokio::test]
    async fn stats_report_gaps_and_dates() {
        let dir = tempdir().unwrap();
        let m = mirror(&dir, Some(5), Some(3)).await;
        m.sync().await.unwrap();

        let stats = m.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.latest, Some(5));
        assert_eq!(stats.missing, vec![3]);
        assert_eq!(stats.without_payload, 0);
        assert_eq!(
            stats.first_published,
            chrono::NaiveDate::from_ymd_opt(2006, 1, 1)
        );
        assert_eq!(
            stats.last_published,
            chrono::NaiveDate::from_ymd_opt(2006, 1, 5)
        );
        assert_eq!(stats.last_sync.unwrap().latest, 5);
    }

    #[tokio::test]
    async fn stats_on_empty_index() {
        let dir = tempdir().unwrap();
        let m = mirror(&dir, Some(1), None).await;

        let stats = m.stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.latest, None);
        assert!(stats.missing.is_empty());
        assert!(stats.last_sync.is_none());
    }

    #[tokio::test]
    async fn dump_lists_documents_in_order() {
        let dir = tempdir().unwrap();
        let m = mirror(&dir, Some(3), None).await;
        m.sync().await.unwrap();

        let rows: Vec<(u32, String)> = m.dump().into_iter().map(|r| (r.id, r.day)).collect();
        assert_eq!(
            rows,
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (3, "3".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn unreadable_index_starts_empty() {
        let dir = tempdir().unwrap();
        let m = mirror(&dir, Some(2), None).await;

        // corrupt a row behind the pool's back
        sqlx::query(
            "INSERT INTO documents (position, id, title, safe_title, day, month, year, image_ref, alt_text, origin_url, news) \
             VALUES (0, 1, 't', 't', 'd', 'm', 'y', '', '', '', '')",
        )
        .execute(m.db.pool())
        .await
        .unwrap();
        sqlx::query("UPDATE documents SET id = 99999999999")
            .execute(m.db.pool())
            .await
            .unwrap();

        assert_eq!(m.load_index().await, 0);
        assert!(m.collection().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);
        config.sync.concurrency = 0;

        let result = Mirror::with_fetcher(
            config,
            Arc::new(StaticFetcher {
                latest: Some(1),
                refuse: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
