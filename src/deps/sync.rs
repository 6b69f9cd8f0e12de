//! `deps sync`: fetch locked dependencies, verify them and clean up leftovers.

use super::lock::LockFile;
use super::types::{Dependency, Manifest, LOCK_FILE};
use crate::checksum::{digest_file, ChecksumRecord};
use crate::core::path::normalize_slashes;
use crate::core::{NexusError, NexusResult};
use crate::nexus::ClientFactory;
use crate::transfer::prune::prune_directory;
use crate::transfer::{DownloadOptions, Downloader, DEFAULT_MAX_CONCURRENT};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Remove files in output directories that no lock entry accounts for
    pub cleanup: bool,
    pub quiet: bool,
    pub show_progress: bool,
    pub max_concurrent: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cleanup: true,
            quiet: false,
            show_progress: false,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dependencies: usize,
    pub verified: usize,
    pub deleted: usize,
}

pub struct Syncer {
    clients: Arc<dyn ClientFactory>,
    default_url: String,
    options: SyncOptions,
}

impl Syncer {
    pub fn new(clients: Arc<dyn ClientFactory>, default_url: &str, options: SyncOptions) -> Self {
        Self {
            clients,
            default_url: default_url.to_string(),
            options,
        }
    }

    /// Bring every dependency in line with `lock`. Relative output
    /// directories are taken from `base_dir`.
    ///
    /// Stops at the first dependency that is missing from the lock file,
    /// fails to download or does not match its locked digests.
    pub async fn sync(
        &self,
        manifest: &Manifest,
        lock: &LockFile,
        base_dir: &Path,
    ) -> NexusResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut tracked: BTreeMap<PathBuf, HashSet<String>> = BTreeMap::new();

        for (name, dependency) in &manifest.dependencies {
            if lock.files(name).is_none() {
                return Err(NexusError::Manifest(format!(
                    "dependency {} not found in {}",
                    name, LOCK_FILE
                )));
            }
            let records = lock.records(name)?;
            let output_dir = base_dir.join(&dependency.output_dir);

            if !self.options.quiet {
                println!();
                println!("[{}]", name);
                println!("  Repository: {}", dependency.repository);
                println!("  Path:       {}", dependency.expanded_path());
                println!("  Output:     {}", dependency.output_dir);
                println!("  Files:      {}", records.len());
                println!("  Checksum:   {}", dependency.checksum);
            }

            self.fetch(dependency, &output_dir).await?;
            verify_records(&output_dir, &records)?;
            report.verified += records.len();
            report.dependencies += 1;
            if !self.options.quiet {
                println!("  ✓ Verified {} file(s)", records.len());
            }

            tracked
                .entry(output_dir)
                .or_default()
                .extend(records.iter().map(|(path, _)| normalize_slashes(path)));
        }

        if self.options.cleanup {
            for (output_dir, keep) in &tracked {
                let deleted = prune_directory(output_dir, keep)?;
                if deleted > 0 {
                    info!("removed {} untracked files from {}", deleted, output_dir.display());
                }
                report.deleted += deleted;
            }
        }
        Ok(report)
    }

    async fn fetch(&self, dependency: &Dependency, output_dir: &Path) -> NexusResult<()> {
        let url = dependency.effective_url(&self.default_url);
        let client = self.clients.client_for(url)?;
        let options = DownloadOptions {
            checksum: dependency.checksum,
            recursive: dependency.recursive,
            quiet: self.options.quiet,
            show_progress: self.options.show_progress,
            max_concurrent: self.options.max_concurrent,
            ..Default::default()
        };
        debug!("syncing {} from {}", dependency.name, url);

        let report = Downloader::new(client, options)
            .download_folder(&dependency.download_source(), output_dir)
            .await?;
        if !report.is_success() {
            return Err(NexusError::TransferFailed {
                failed: report.summary.failed,
            });
        }
        Ok(())
    }
}

/// Check every locked file under `output_dir` against its recorded digest.
pub fn verify_records(output_dir: &Path, records: &[(String, ChecksumRecord)]) -> NexusResult<()> {
    for (path, record) in records {
        let local = output_dir.join(normalize_slashes(path));
        let actual = digest_file(&local, record.algorithm)?;
        if !record.matches(&actual) {
            return Err(NexusError::ChecksumMismatch {
                path: local.display().to_string(),
                expected: record.hex_digest.clone(),
                actual,
            });
        }
    }
    Ok(())
}
