//! Nexus repository access.
//!
//! [`RepositoryClient`] is the seam between the transfer logic and the REST
//! API; [`NexusClient`] implements it over HTTP and [`mock::MockRepositoryClient`]
//! in memory.

pub mod client;
pub mod mock;
pub mod multipart;
pub mod types;

pub use client::NexusClient;
pub use types::{RemoteAsset, SearchResponse};

use crate::core::NexusResult;
use crate::transfer::pipe::ByteStream;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// Remote operations needed by uploads, downloads and dependency resolution
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Every asset below `path_prefix` (a folder), following continuation tokens.
    async fn list_assets(&self, repository: &str, path_prefix: &str)
        -> NexusResult<Vec<RemoteAsset>>;

    /// Every asset whose path starts with `path_prefix`.
    async fn search_assets(
        &self,
        repository: &str,
        path_prefix: &str,
    ) -> NexusResult<Vec<RemoteAsset>>;

    /// The single asset stored at exactly `path`.
    async fn get_asset_by_path(&self, repository: &str, path: &str) -> NexusResult<RemoteAsset>;

    /// Post a multipart component upload whose body is streamed from `body`.
    async fn upload_component(
        &self,
        repository: &str,
        body: ByteStream,
        content_type: &str,
    ) -> NexusResult<()>;

    /// Stream an asset's content into `dest`, returning the byte count.
    async fn download_asset(
        &self,
        download_url: &str,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> NexusResult<u64>;
}

/// Builds a repository client for a server URL
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, url: &str) -> NexusResult<Arc<dyn RepositoryClient>>;
}

/// HTTP clients sharing one set of credentials
pub struct HttpClientFactory {
    username: String,
    password: String,
}

impl HttpClientFactory {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn client_for(&self, url: &str) -> NexusResult<Arc<dyn RepositoryClient>> {
        Ok(Arc::new(NexusClient::new(url, &self.username, &self.password)?))
    }
}
