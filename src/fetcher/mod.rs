//! Document retrieval
//!
//! [`Fetcher`] turns an identifier (or "latest") into a [`crate::Document`]. The
//! HTTP implementation is split in two layers so tests and alternative sources can
//! swap either one:
//!
//! - [`Transport`]: `get(url) -> bytes`, failing on network errors and non-success
//!   statuses ([`HttpTransport`] over `reqwest`)
//! - [`HttpFetcher`]: builds `{base}/info.0.json` and `{base}/{id}/info.0.json`
//!   URLs and decodes the JSON body

mod http;
mod traits;

pub(crate) use http::parse_base_url;
pub use http::{HttpFetcher, HttpTransport};
pub use traits::{Fetcher, Transport};

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
