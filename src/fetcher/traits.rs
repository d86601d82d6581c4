//! Traits for document retrieval

use crate::types::Document;
use async_trait::async_trait;

/// Raw byte transport
///
/// The only network-facing seam of the crate. Implementations fail with
/// [`crate::Error::Transport`] on connection problems and on any non-success status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body at `url`
    async fn get(&self, url: &str) -> crate::Result<Vec<u8>>;
}

/// Produces documents from the remote series
///
/// # Examples
///
/// ```no_run
/// use xkcd_mirror::fetcher::{Fetcher, HttpFetcher};
/// use xkcd_mirror::config::SourceConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::from_config(&SourceConfig::default())?;
///
/// let latest = fetcher.fetch_latest().await?;
/// let first = fetcher.fetch_by_id(1).await?;
/// println!("{} comics, the first is {:?}", latest.id, first.title);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Resolve the most recent document
    ///
    /// # Errors
    ///
    /// [`crate::Error::Transport`] when the source is unreachable and
    /// [`crate::Error::Decode`] when the body is not a resolved document.
    async fn fetch_latest(&self) -> crate::Result<Document>;

    /// Fetch document `id`
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidId`] for `id == 0`, otherwise as [`Fetcher::fetch_latest`].
    async fn fetch_by_id(&self, id: u32) -> crate::Result<Document>;

    /// Fetch the binary content a document refers to
    ///
    /// Callers treat failure as "no payload"; the document itself stays valid.
    async fn fetch_payload(&self, uri: &str) -> crate::Result<Vec<u8>>;
}
