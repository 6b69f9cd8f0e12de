use crate::checksum::ChecksumAlgorithm;
use crate::core::path::{config_file, ensure_dir};
use crate::core::{NexusError, NexusResult};
use crate::transfer::DEFAULT_MAX_CONCURRENT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ENV_URL: &str = "NEXUS_URL";
pub const ENV_USER: &str = "NEXUS_USER";
pub const ENV_PASS: &str = "NEXUS_PASS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the repository server
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_credential")]
    pub username: String,

    #[serde(default = "default_credential")]
    pub password: String,

    /// Upper bound on simultaneous per-file transfers
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Default checksum algorithm for skip decisions
    /// - "sha1" (default), "sha256", "sha512" or "md5"
    #[serde(default = "default_checksum")]
    pub checksum: String,
}

fn default_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_credential() -> String {
    "admin".to_string()
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_checksum() -> String {
    ChecksumAlgorithm::default().as_str().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_credential(),
            password: default_credential(),
            max_concurrent: default_max_concurrent(),
            checksum: default_checksum(),
        }
    }
}

impl Config {
    /// Load config from the platform-specific config directory.
    ///
    /// A missing file yields the defaults; nothing is written.
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\nexus-cli\config.yaml
    /// - Linux: ~/.config/nexus-cli/config.yaml
    /// - macOS: ~/Library/Application Support/nexus-cli/config.yaml
    pub fn load() -> NexusResult<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> NexusResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| NexusError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to the platform-specific config directory
    pub fn save(&self) -> NexusResult<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> NexusResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| NexusError::Path("Invalid config path".to_string()))?;
        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| NexusError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply values given on the command line or through `NEXUS_URL`,
    /// `NEXUS_USER` and `NEXUS_PASS`; these win over the file.
    pub fn with_overrides(
        mut self,
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(password) = password {
            self.password = password;
        }
        self
    }

    /// The configured default checksum algorithm.
    pub fn checksum_algorithm(&self) -> NexusResult<ChecksumAlgorithm> {
        self.checksum.parse()
    }
}
