//! Concurrent synchronization engine
//!
//! One [`Synchronizer::run`] brings a [`Collection`] up to date with the remote
//! series:
//!
//! 1. **Discovering**: resolve the latest document; its id is the upper bound of the
//!    run. The latest document is added unless already indexed. Failure here aborts
//!    the run before anything is scheduled.
//! 2. **Fetching**: spawn one task per id in `[1, upper_bound)` that is not indexed.
//!    A semaphore admits at most `sync.concurrency` tasks into the fetch section at
//!    once.
//! 3. Successful tasks send their document into a bounded channel with a single
//!    consumer, the only writer to the collection during the fan-out. Failed tasks
//!    send nothing; the item is picked up again by the next run.
//! 4. **Draining**: all tasks are joined, the channel closes with the last sender and
//!    the consumer flushes what is left.
//! 5. **Done**: a [`SyncReport`] is returned. Insertion order is unspecified, so the
//!    caller sorts before persisting.

mod background_tasks;

use crate::collection::Collection;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::types::{Document, DocumentId, Event, SyncPhase, SyncReport};
use background_tasks::{ProgressReporterParams, spawn_collection_writer, spawn_progress_reporter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, broadcast, mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one fetch task
#[derive(Debug)]
enum FetchOutcome {
    Fetched { id: DocumentId, has_payload: bool },
    Failed { id: DocumentId, error: String },
}

/// Drives synchronization runs against a [`Fetcher`]
///
/// The synchronizer keeps no documents itself; the collection is passed to each run.
pub struct Synchronizer {
    fetcher: Arc<dyn Fetcher>,
    config: SyncConfig,
    event_tx: broadcast::Sender<Event>,
    phase_tx: watch::Sender<SyncPhase>,
}

impl Synchronizer {
    /// Create an idle synchronizer
    pub fn new(fetcher: Arc<dyn Fetcher>, config: SyncConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        let (phase_tx, _rx) = watch::channel(SyncPhase::Idle);
        Self {
            fetcher,
            config,
            event_tx,
            phase_tx,
        }
    }

    /// Subscribe to run events
    ///
    /// Subscribers that fall behind lose the oldest events; the run never waits.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase_tx.borrow()
    }

    /// Watch phase changes
    pub fn watch_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: SyncPhase) {
        debug!(?phase, "Synchronizer phase");
        self.phase_tx.send_replace(phase);
    }

    fn emit(&self, event: Event) {
        // no subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Bring `collection` up to date with the remote series
    ///
    /// # Errors
    ///
    /// Only discovery failures are returned; the collection is untouched in that case.
    /// Per-document failures are reported in [`SyncReport::failed`].
    pub async fn run(&self, collection: Arc<Collection>) -> Result<SyncReport> {
        let started = Instant::now();

        self.set_phase(SyncPhase::Discovering);
        self.emit(Event::Discovering);

        let mut latest = match self.fetcher.fetch_latest().await {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "Failed to resolve the latest document");
                self.set_phase(SyncPhase::Idle);
                return Err(e);
            }
        };
        let upper_bound = latest.id;

        let latest_added = if collection.contains(upper_bound) {
            false
        } else {
            if self.config.fetch_payloads {
                attach_payload(self.fetcher.as_ref(), &mut latest).await;
            }
            collection.add(latest);
            true
        };

        let missing = collection.missing(upper_bound.saturating_sub(1));
        info!(
            latest = upper_bound,
            missing = missing.len(),
            indexed = collection.len(),
            "Discovered latest document"
        );
        self.emit(Event::Discovered {
            latest: upper_bound,
            missing: missing.len(),
        });

        self.set_phase(SyncPhase::Fetching);

        let cancel_token = CancellationToken::new();
        let progress_task = spawn_progress_reporter(ProgressReporterParams {
            collection: Arc::clone(&collection),
            upper_bound,
            interval: self.config.progress_interval,
            event_tx: self.event_tx.clone(),
            cancel_token: cancel_token.child_token(),
        });

        let (document_tx, document_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let writer_task = spawn_collection_writer(Arc::clone(&collection), document_rx);

        let limiter = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let scheduled = missing.len();

        for id in missing {
            let fetcher = Arc::clone(&self.fetcher);
            let limiter = Arc::clone(&limiter);
            let document_tx = document_tx.clone();
            let fetch_payloads = self.config.fetch_payloads;

            tasks.spawn(async move {
                let permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return FetchOutcome::Failed {
                            id,
                            error: e.to_string(),
                        };
                    }
                };
                let result = fetch_document(fetcher.as_ref(), id, fetch_payloads).await;
                drop(permit);

                match result {
                    Ok(document) => {
                        let has_payload = document.has_payload();
                        if document_tx.send(document).await.is_err() {
                            return FetchOutcome::Failed {
                                id,
                                error: "collection writer stopped".to_string(),
                            };
                        }
                        FetchOutcome::Fetched { id, has_payload }
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Failed to fetch document");
                        FetchOutcome::Failed {
                            id,
                            error: e.to_string(),
                        }
                    }
                }
            });
        }

        self.set_phase(SyncPhase::Draining);
        drop(document_tx);

        let mut failed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(FetchOutcome::Fetched { id, has_payload }) => {
                    self.emit(Event::Fetched { id, has_payload });
                }
                Ok(FetchOutcome::Failed { id, error }) => {
                    failed.push(id);
                    self.emit(Event::FetchFailed { id, error });
                }
                Err(e) => {
                    error!(error = %e, "Fetch task panicked");
                }
            }
        }

        let writer_stats = writer_task
            .await
            .map_err(|e| Error::Other(format!("collection writer failed: {}", e)))?;

        cancel_token.cancel();
        if let Err(e) = progress_task.await {
            warn!(error = %e, "Progress reporter ended abnormally");
        }

        failed.sort_unstable();
        let latest_without_payload = latest_added
            && collection
                .get(upper_bound)
                .is_some_and(|(_, document)| !document.has_payload());

        let report = SyncReport {
            latest: upper_bound,
            latest_added,
            scheduled,
            fetched: writer_stats.added,
            failed,
            missing_payloads: writer_stats.missing_payloads + usize::from(latest_without_payload),
            elapsed: started.elapsed(),
        };

        info!(
            latest = report.latest,
            added = report.added(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Synchronization complete"
        );
        self.emit(Event::Complete {
            fetched: report.added(),
            failed: report.failed.len(),
            elapsed_ms: report.elapsed.as_millis() as u64,
        });
        self.set_phase(SyncPhase::Done);

        Ok(report)
    }
}

/// Fetch document `id` and, when enabled, its image
async fn fetch_document(
    fetcher: &dyn Fetcher,
    id: DocumentId,
    fetch_payloads: bool,
) -> Result<Document> {
    let mut document = fetcher.fetch_by_id(id).await?;
    if fetch_payloads {
        attach_payload(fetcher, &mut document).await;
    }
    Ok(document)
}

/// Best-effort image download; the document stays valid without it
async fn attach_payload(fetcher: &dyn Fetcher, document: &mut Document) {
    if document.image_ref.trim().is_empty() {
        debug!(id = document.id, "Document has no image reference");
        return;
    }
    match fetcher.fetch_payload(&document.image_ref).await {
        Ok(bytes) => document.payload = Some(bytes),
        Err(e) => {
            warn!(id = document.id, error = %e, "Failed to fetch image, keeping document without it");
        }
    }
}
