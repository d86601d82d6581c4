//! Background tasks for progress reporting and collection writes.

use crate::collection::Collection;
use crate::types::{Document, DocumentId, Event};
use std::sync::Arc;
use std::time::Duration;

/// Parameters for spawning a progress reporter background task
pub(crate) struct ProgressReporterParams {
    /// Collection being filled
    pub collection: Arc<Collection>,
    /// Id of the latest document
    pub upper_bound: DocumentId,
    /// Time between reports
    pub interval: Duration,
    /// Event broadcast sender
    pub event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Cancellation token
    pub cancel_token: tokio_util::sync::CancellationToken,
}

/// Spawn a background task that periodically reports how full the collection is.
pub(crate) fn spawn_progress_reporter(
    params: ProgressReporterParams,
) -> tokio::task::JoinHandle<()> {
    let ProgressReporterParams {
        collection,
        upper_bound,
        interval,
        event_tx,
        cancel_token,
    } = params;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let indexed = collection.len();
                    let percent = progress_percent(indexed, upper_bound);

                    tracing::debug!(
                        indexed,
                        upper_bound,
                        percent = %format!("{:.2}%", percent),
                        "Index status"
                    );

                    event_tx
                        .send(Event::Progress {
                            indexed,
                            upper_bound,
                            percent,
                        })
                        .ok();
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
    })
}

/// `indexed / upper_bound * 100`, `0` for an empty range
pub(crate) fn progress_percent(indexed: usize, upper_bound: DocumentId) -> f32 {
    if upper_bound == 0 {
        return 0.0;
    }
    (indexed as f32 / upper_bound as f32) * 100.0
}

/// What the collection writer saw before its channel closed
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct WriterStats {
    /// Documents added to the collection
    pub added: usize,
    /// Added documents without image bytes
    pub missing_payloads: usize,
}

/// Spawn the single consumer that moves fetched documents into the collection.
///
/// Exits once every sender is dropped and the buffer is empty.
pub(crate) fn spawn_collection_writer(
    collection: Arc<Collection>,
    mut document_rx: tokio::sync::mpsc::Receiver<Document>,
) -> tokio::task::JoinHandle<WriterStats> {
    tokio::spawn(async move {
        let mut stats = WriterStats::default();

        while let Some(document) = document_rx.recv().await {
            if !document.has_payload() {
                stats.missing_payloads += 1;
            }
            tracing::trace!(id = document.id, "Adding document to collection");
            collection.add(document);
            stats.added += 1;
        }

        stats
    })
}
