//! Shared test helpers for creating Mirror instances in tests.

use crate::config::Config;
use crate::error::{Error, TransportError};
use crate::fetcher::Fetcher;
use crate::mirror::Mirror;
use crate::types::Document;
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

/// Fetcher that serves ids `1..=latest` from memory
///
/// `latest == None` makes discovery fail; `refuse` makes one id fail to decode.
pub(crate) struct StaticFetcher {
    pub latest: Option<u32>,
    pub refuse: Option<u32>,
}

impl StaticFetcher {
    pub(crate) fn document(id: u32) -> Document {
        Document {
            id,
            title: format!("Comic {id}"),
            safe_title: format!("Comic {id}"),
            day: id.to_string(),
            month: "1".to_string(),
            year: "2006".to_string(),
            image_ref: format!("test://img/comic_{id}.png"),
            alt_text: format!("alt {id}"),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_latest(&self) -> crate::Result<Document> {
        match self.latest {
            Some(id) => self.fetch_by_id(id).await,
            None => Err(TransportError::Status {
                url: "test://info.0.json".to_string(),
                status: 500,
            }
            .into()),
        }
    }

    async fn fetch_by_id(&self, id: u32) -> crate::Result<Document> {
        if id == 0 {
            return Err(Error::InvalidId(id));
        }
        if self.refuse == Some(id) {
            return Err(Error::Decode {
                url: format!("test://{id}/info.0.json"),
                reason: "refused".to_string(),
            });
        }
        Ok(Self::document(id))
    }

    async fn fetch_payload(&self, uri: &str) -> crate::Result<Vec<u8>> {
        Ok(uri.as_bytes().to_vec())
    }
}

/// Config whose data directory lives inside `dir`
pub(crate) fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.data_dir = dir.path().to_path_buf();
    config
}

/// Mirror over a [`StaticFetcher`] in `dir`
pub(crate) async fn create_mirror_in(
    dir: &TempDir,
    latest: Option<u32>,
    refuse: Option<u32>,
) -> Mirror {
    Mirror::with_fetcher(
        test_config(dir),
        Arc::new(StaticFetcher { latest, refuse }),
    )
    .await
    .unwrap()
}

/// Helper to create a test Mirror instance with a persistent database.
/// Returns the mirror and the tempdir (which must be kept alive).
pub(crate) async fn create_test_mirror(latest: u32) -> (Mirror, TempDir) {
    let temp_dir = tempdir().unwrap();
    let mirror = create_mirror_in(&temp_dir, Some(latest), None).await;
    (mirror, temp_dir)
}
