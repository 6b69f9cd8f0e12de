use crate::checksum::Checksums;
use crate::core::path::normalize_slashes;
use serde::{Deserialize, Serialize};

/// One asset as reported by the search API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub format: String,
    #[serde(default, rename = "checksum")]
    pub checksums: Checksums,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub file_size: u64,
}

impl RemoteAsset {
    /// Asset path without leading or doubled slashes.
    pub fn normalized_path(&self) -> String {
        normalize_slashes(&self.path)
    }
}

/// One page of `GET /service/rest/v1/search/assets`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RemoteAsset>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}
