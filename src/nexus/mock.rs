//! In-memory [`RepositoryClient`] for tests
//!
//! # Example
//!
//! ```
//! use nexus_cli::nexus::mock::MockRepositoryClient;
//!
//! let client = MockRepositoryClient::new();
//! let asset = client.add_asset("libs", "docs/example-1.0.0.txt", b"hello");
//! assert_eq!(asset.file_size, 5);
//! ```

use super::types::RemoteAsset;
use super::{ClientFactory, RepositoryClient};
use crate::checksum::{digest_bytes, ChecksumAlgorithm, Checksums};
use crate::core::path::normalize_slashes;
use crate::core::{NexusError, NexusResult};
use crate::transfer::pipe::ByteStream;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// An upload captured by the mock
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub repository: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RecordedUpload {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct State {
    assets: Vec<RemoteAsset>,
    contents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    uploads: Vec<RecordedUpload>,
    downloads: Vec<String>,
    client_urls: Vec<String>,
}

/// Repository held in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MockRepositoryClient {
    state: Arc<Mutex<State>>,
}

impl MockRepositoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `content` at `path`, publishing all four digests.
    pub fn add_asset(&self, repository: &str, path: &str, content: &[u8]) -> RemoteAsset {
        let checksums = Checksums {
            sha1: Some(digest_bytes(content, ChecksumAlgorithm::Sha1)),
            sha256: Some(digest_bytes(content, ChecksumAlgorithm::Sha256)),
            sha512: Some(digest_bytes(content, ChecksumAlgorithm::Sha512)),
            md5: Some(digest_bytes(content, ChecksumAlgorithm::Md5)),
        };
        let asset = RemoteAsset {
            download_url: format!("mock://{}/{}", repository, normalize_slashes(path)),
            path: path.to_string(),
            id: format!("{}:{}", repository, path),
            repository: repository.to_string(),
            format: "raw".to_string(),
            checksums,
            content_type: "application/octet-stream".to_string(),
            file_size: content.len() as u64,
        };
        self.add_raw_asset(asset.clone(), Some(content.to_vec()));
        asset
    }

    /// Store an asset record as given, optionally with downloadable content.
    pub fn add_raw_asset(&self, asset: RemoteAsset, content: Option<Vec<u8>>) {
        let mut state = self.state();
        if let Some(content) = content {
            state.contents.insert(asset.download_url.clone(), content);
        }
        state.assets.push(asset);
    }

    /// Make downloads of the asset at `path` fail.
    pub fn fail_download(&self, repository: &str, path: &str) {
        let url = format!("mock://{}/{}", repository, normalize_slashes(path));
        self.state().failing.insert(url);
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state().uploads.clone()
    }

    /// Server URLs clients were requested for through [`ClientFactory`].
    pub fn client_urls(&self) -> Vec<String> {
        self.state().client_urls.clone()
    }

    /// Download URLs requested so far, in request order.
    pub fn downloads(&self) -> Vec<String> {
        self.state().downloads.clone()
    }

    fn matching<F>(&self, repository: &str, predicate: F) -> Vec<RemoteAsset>
    where
        F: Fn(&str) -> bool,
    {
        let mut found: Vec<RemoteAsset> = self
            .state()
            .assets
            .iter()
            .filter(|a| a.repository == repository && predicate(&a.normalized_path()))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.normalized_path());
        found
    }
}

#[async_trait]
impl RepositoryClient for MockRepositoryClient {
    async fn list_assets(
        &self,
        repository: &str,
        path_prefix: &str,
    ) -> NexusResult<Vec<RemoteAsset>> {
        let prefix = normalize_slashes(path_prefix);
        Ok(self.matching(repository, |p| {
            prefix.is_empty() || p.starts_with(&format!("{}/", prefix))
        }))
    }

    async fn search_assets(
        &self,
        repository: &str,
        path_prefix: &str,
    ) -> NexusResult<Vec<RemoteAsset>> {
        let prefix = path_prefix.trim_start_matches('/').to_string();
        Ok(self.matching(repository, |p| p.starts_with(&prefix)))
    }

    async fn get_asset_by_path(&self, repository: &str, path: &str) -> NexusResult<RemoteAsset> {
        let wanted = normalize_slashes(path);
        self.matching(repository, |p| p == wanted)
            .into_iter()
            .next()
            .ok_or_else(|| NexusError::AssetNotFound(path.to_string()))
    }

    async fn upload_component(
        &self,
        repository: &str,
        mut body: ByteStream,
        content_type: &str,
    ) -> NexusResult<()> {
        let mut collected = Vec::new();
        while let Some(chunk) = body.next().await {
            collected.extend_from_slice(&chunk?);
        }
        self.state().uploads.push(RecordedUpload {
            repository: repository.to_string(),
            content_type: content_type.to_string(),
            body: collected,
        });
        Ok(())
    }

    async fn download_asset(
        &self,
        download_url: &str,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> NexusResult<u64> {
        let content = {
            let mut state = self.state();
            state.downloads.push(download_url.to_string());
            if state.failing.contains(download_url) {
                return Err(NexusError::Protocol {
                    status: 500,
                    message: format!("download of {} failed", download_url),
                });
            }
            state
                .contents
                .get(download_url)
                .cloned()
                .ok_or_else(|| NexusError::Protocol {
                    status: 404,
                    message: format!("download of {} failed", download_url),
                })?
        };
        dest.write_all(&content).await?;
        dest.flush().await?;
        Ok(content.len() as u64)
    }
}

/// Every URL maps to this same in-memory repository.
impl ClientFactory for MockRepositoryClient {
    fn client_for(&self, url: &str) -> NexusResult<Arc<dyn RepositoryClient>> {
        self.state().client_urls.push(url.to_string());
        Ok(Arc::new(self.clone()))
    }
}
