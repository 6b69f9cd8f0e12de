use super::types::{RemoteAsset, SearchResponse};
use super::RepositoryClient;
use crate::core::path::normalize_slashes;
use crate::core::{NexusError, NexusResult};
use crate::transfer::pipe::ByteStream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client, Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

const SEARCH_ASSETS_PATH: &str = "/service/rest/v1/search/assets";
const COMPONENTS_PATH: &str = "/service/rest/v1/components";

/// HTTP client for the Nexus REST API, authenticating every call with basic auth
#[derive(Clone)]
pub struct NexusClient {
    base_url: String,
    username: String,
    password: String,
    http: Client,
}

impl NexusClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> NexusResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("nexuscli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    async fn search_page(&self, query: &[(&str, String)]) -> NexusResult<SearchResponse> {
        let url = format!("{}{}", self.base_url, SEARCH_ASSETS_PATH);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await?;
        let response = error_for_status(response).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| NexusError::Protocol {
            status,
            message: format!("malformed search response: {}", e),
        })
    }

    /// Follow continuation tokens until the server stops returning one.
    async fn search_all(&self, base_query: Vec<(&str, String)>) -> NexusResult<Vec<RemoteAsset>> {
        let mut assets = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = base_query.clone();
            if let Some(t) = &token {
                query.push(("continuationToken", t.clone()));
            }
            let page = self.search_page(&query).await?;
            pages += 1;
            debug!("Search page {} returned {} asset(s)", pages, page.items.len());
            assets.extend(page.items);

            match page.continuation_token {
                Some(next) if !next.is_empty() => {
                    if token.as_deref() == Some(next.as_str()) {
                        return Err(NexusError::Protocol {
                            status: 200,
                            message: format!("continuation token '{}' repeated", next),
                        });
                    }
                    token = Some(next);
                }
                _ => break,
            }
        }

        Ok(assets)
    }
}

/// Map a non-success response to a protocol error carrying its body.
async fn error_for_status(response: Response) -> NexusResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(NexusError::Protocol {
        status: status.as_u16(),
        message: body.trim().to_string(),
    })
}

#[async_trait]
impl RepositoryClient for NexusClient {
    async fn list_assets(
        &self,
        repository: &str,
        path_prefix: &str,
    ) -> NexusResult<Vec<RemoteAsset>> {
        let prefix = normalize_slashes(path_prefix);
        let q = if prefix.is_empty() {
            "/*".to_string()
        } else {
            format!("/{}/*", prefix)
        };
        self.search_all(vec![
            ("repository", repository.to_string()),
            ("format", "raw".to_string()),
            ("direction", "asc".to_string()),
            ("sort", "name".to_string()),
            ("q", q),
        ])
        .await
    }

    async fn search_assets(
        &self,
        repository: &str,
        path_prefix: &str,
    ) -> NexusResult<Vec<RemoteAsset>> {
        self.search_all(vec![
            ("repository", repository.to_string()),
            ("q", format!("/{}*", path_prefix.trim_start_matches('/'))),
        ])
        .await
    }

    async fn get_asset_by_path(&self, repository: &str, path: &str) -> NexusResult<RemoteAsset> {
        let wanted = normalize_slashes(path);
        let candidates = self
            .search_all(vec![
                ("repository", repository.to_string()),
                ("q", format!("/{}", wanted)),
            ])
            .await?;
        candidates
            .into_iter()
            .find(|asset| asset.normalized_path() == wanted)
            .ok_or_else(|| NexusError::AssetNotFound(path.to_string()))
    }

    async fn upload_component(
        &self,
        repository: &str,
        body: ByteStream,
        content_type: &str,
    ) -> NexusResult<()> {
        let url = format!("{}{}", self.base_url, COMPONENTS_PATH);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("repository", repository)])
            .header(CONTENT_TYPE, content_type)
            .body(Body::wrap_stream(body))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK | StatusCode::CREATED => Ok(()),
            StatusCode::NOT_FOUND => Err(NexusError::RepositoryNotFound(repository.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(NexusError::Protocol {
                    status: status.as_u16(),
                    message: format!("upload failed: {}", body.trim()),
                })
            }
        }
    }

    async fn download_asset(
        &self,
        download_url: &str,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> NexusResult<u64> {
        let response = self
            .http
            .get(download_url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(NexusError::Protocol {
                status: response.status().as_u16(),
                message: format!("download of {} failed", download_url),
            });
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;
        Ok(written)
    }
}
