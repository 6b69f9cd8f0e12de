use std::path::PathBuf;
use thiserror::Error;

pub type NexusResult<T> = Result<T, NexusError>;

/// Exit code used when a download finds nothing at the requested path.
pub const EXIT_NO_ASSETS: u8 = 66;

#[derive(Error, Debug)]
pub enum NexusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    Path(String),

    /// A bad flag, option or configuration value. Reported before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unknown key '{key}' in section [{section}]")]
    UnknownKey { key: String, section: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unsupported checksum algorithm '{0}': must be one of: sha1, sha256, sha512, md5")]
    UnsupportedAlgorithm(String),

    #[error("unsupported compression format '{0}': must be one of: gzip, zstd, zip")]
    UnsupportedFormat(String),

    /// Non-success response or malformed body from the repository.
    #[error("request failed with status {status}: {message}")]
    Protocol { status: u16, message: String },

    #[error("repository '{0}' not found")]
    RepositoryNotFound(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// A dependency could not be resolved to remote assets.
    #[error("{0}")]
    Resolution(String),

    #[error("No assets found in folder '{path}' in repository '{repository}'")]
    NoAssetsFound { repository: String, path: String },

    #[error("no {algorithm} checksum available for {subject}")]
    ChecksumUnavailable { algorithm: String, subject: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// An archive entry would resolve outside the extraction root.
    #[error("illegal file path in archive: {path}")]
    PathTraversal { path: String },

    #[error("failed to write {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A listed asset would be written outside the download directory.
    #[error("asset path escapes the destination directory: {path}")]
    UnsafeAssetPath { path: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Pipe error: {0}")]
    Pipe(String),

    #[error("{failed} transfer(s) failed")]
    TransferFailed { failed: usize },
}

impl NexusError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            NexusError::NoAssetsFound { .. } => EXIT_NO_ASSETS,
            _ => 1,
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NexusError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
