//! HTTP implementation of the fetcher

use super::traits::{Fetcher, Transport};
use crate::config::SourceConfig;
use crate::error::{Error, Result, TransportError};
use crate::types::Document;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the configured timeout and user agent
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Body {
                url: url.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }
}

/// Document as served by the `info.0.json` endpoints
#[derive(Debug, Deserialize)]
struct WireDocument {
    num: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    safe_title: String,
    #[serde(default)]
    day: String,
    #[serde(default)]
    month: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    img: String,
    #[serde(default)]
    alt: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    news: String,
}

impl From<WireDocument> for Document {
    fn from(wire: WireDocument) -> Self {
        Document {
            id: wire.num,
            title: wire.title,
            safe_title: wire.safe_title,
            day: wire.day,
            month: wire.month,
            year: wire.year,
            transcript: Some(wire.transcript).filter(|t| !t.is_empty()),
            image_ref: wire.img,
            alt_text: wire.alt,
            origin_url: wire.link,
            news: wire.news,
            payload: None,
        }
    }
}

/// Decode an `info.0.json` body
///
/// A body that parses but carries `num == 0` is rejected: such a document has no
/// place in the index.
pub(crate) fn decode_document(url: &str, body: &[u8]) -> Result<Document> {
    let wire: WireDocument = serde_json::from_slice(body).map_err(|e| Error::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if wire.num == 0 {
        return Err(Error::Decode {
            url: url.to_string(),
            reason: "document has no number".to_string(),
        });
    }

    Ok(wire.into())
}

/// [`Fetcher`] that talks to an xkcd-compatible JSON endpoint
pub struct HttpFetcher<T = HttpTransport> {
    transport: T,
    base_url: Url,
}

impl HttpFetcher<HttpTransport> {
    /// Fetcher over a fresh [`HttpTransport`]
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self::new(HttpTransport::new(config)?, base_url))
    }
}

impl<T: Transport> HttpFetcher<T> {
    /// Fetcher over an arbitrary transport
    ///
    /// `base_url` should end with a slash; relative joins otherwise drop its last
    /// path segment.
    pub fn new(transport: T, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// URL of the latest-document endpoint
    pub fn latest_url(&self) -> Result<Url> {
        self.join("info.0.json")
    }

    /// URL of the endpoint for document `id`
    pub fn document_url(&self, id: u32) -> Result<Url> {
        self.join(&format!("{}/info.0.json", id))
    }

    fn join(&self, relative: &str) -> Result<Url> {
        self.base_url
            .join(relative)
            .map_err(|e| Error::Other(format!("cannot build URL for '{}': {}", relative, e)))
    }

    async fn fetch_document(&self, url: Url) -> Result<Document> {
        debug!(url = %url, "fetching document");
        let body = self.transport.get(url.as_str()).await?;
        decode_document(url.as_str(), &body)
    }
}

#[async_trait]
impl<T: Transport> Fetcher for HttpFetcher<T> {
    async fn fetch_latest(&self) -> Result<Document> {
        let url = self.latest_url()?;
        self.fetch_document(url).await
    }

    async fn fetch_by_id(&self, id: u32) -> Result<Document> {
        if id == 0 {
            return Err(Error::InvalidId(id));
        }
        let url = self.document_url(id)?;
        let document = self.fetch_document(url.clone()).await?;

        if document.id != id {
            return Err(Error::Decode {
                url: url.to_string(),
                reason: format!("expected document {}, got {}", id, document.id),
            });
        }
        Ok(document)
    }

    async fn fetch_payload(&self, uri: &str) -> Result<Vec<u8>> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::NotFound("image reference".to_string()));
        }
        // absolute references are used as-is, relative ones resolve against the source
        let url = self.join(uri)?;
        debug!(url = %url, "fetching payload");
        self.transport.get(url.as_str()).await
    }
}

/// Parse a base URL and make sure it ends with a slash
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| Error::Config {
        message: format!("invalid base URL '{}': {}", raw, e),
        key: Some("source.base_url".to_string()),
    })
}
