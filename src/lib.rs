//! # xkcd-mirror
//!
//! Incremental, concurrent mirror of the numbered xkcd series.
//!
//! A mirror keeps a local index of comics (metadata plus image bytes) in SQLite.
//! Each sync asks the source for the most recent comic, works out which ids below
//! it are not yet indexed, and fetches just those with bounded concurrency.
//! Ids that fail to fetch are skipped and retried on the next sync.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xkcd_mirror::{Config, Mirror};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mirror = Mirror::new(Config::default()).await?;
//!     mirror.load_index().await;
//!
//!     // Subscribe to events
//!     let mut events = mirror.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = mirror.sync().await?;
//!     println!("{} new comics, {} failed", report.added(), report.failed.len());
//!
//!     mirror.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Read-only REST API
pub mod api;
/// In-memory document index
pub mod collection;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Remote document retrieval
pub mod fetcher;
/// Subscriber setup for stderr and file logging
pub mod logging;
/// Top-level mirror handle
pub mod mirror;
/// Concurrent gap-filling synchronization
pub mod synchronizer;
/// Core types and events
pub mod types;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use collection::Collection;
pub use config::{ApiConfig, Config, PersistenceConfig, SourceConfig, SyncConfig};
pub use db::Database;
pub use error::{
    ApiError, Error, ErrorDetail, PersistenceError, Result, ToHttpStatus, TransportError,
};
pub use fetcher::{Fetcher, HttpFetcher, HttpTransport, Transport};
pub use mirror::Mirror;
pub use synchronizer::Synchronizer;
pub use types::{
    Document, DocumentId, DocumentSummary, Event, IndexStats, SyncPhase, SyncRecord, SyncReport,
};

/// Wait for a termination signal, then close the mirror's database.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use xkcd_mirror::{Config, Mirror, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mirror = Mirror::new(Config::default()).await?;
///     mirror.load_index().await;
///
///     tokio::select! {
///         result = xkcd_mirror::api::start_api_server(mirror.clone()) => result?,
///         _ = run_with_shutdown(mirror.clone()) => {}
///     }
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(mirror: Mirror) {
    wait_for_signal().await;
    mirror.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
