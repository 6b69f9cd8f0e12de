//! Transfer engine: moves files between a local directory and a repository.
//!
//! [`Uploader`] and [`Downloader`] run either many independent per-file
//! transfers on a bounded worker pool, or a single archive streamed through a
//! [`pipe`] between an encoder and the HTTP body.

pub mod download;
pub mod options;
pub mod outcome;
pub mod pipe;
pub mod progress;
pub mod prune;
pub mod target;
pub mod upload;
pub mod workers;

pub use download::Downloader;
pub use options::{DownloadOptions, SkipPolicy, UploadOptions, DEFAULT_MAX_CONCURRENT};
pub use outcome::{
    SkipReason, TransferDirection, TransferOutcome, TransferReport, TransferSummary,
    TransferTracker,
};
pub use progress::{format_bytes, CountingWriter, Progress};
pub use upload::Uploader;
