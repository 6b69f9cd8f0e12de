//! Nexus CLI: sync files between a local filesystem and a Nexus raw repository
//!
//! The library holds everything the `nexuscli` binary does: uploads and
//! downloads of whole directories (optionally as one streamed archive), and
//! dependency manifests resolved into deterministic lock files.

pub use nexus_core::{NexusError, NexusResult};

/// Core module re-exported from nexus-core.
pub mod core {
    pub use nexus_core::core::*;
}

/// Configuration management.
pub mod config;

/// Checksums and validation.
pub mod checksum;

/// Glob filtering and local file enumeration.
pub mod filter;

/// Streaming tar.gz, tar.zst and zip codecs.
pub mod archive;

/// Upload and download orchestration.
pub mod transfer;

/// Repository REST client.
pub mod nexus;

/// Dependency manifests and lock files.
pub mod deps;
