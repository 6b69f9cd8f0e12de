//! Folder download, per asset or as one streamed archive.

use super::options::{DownloadOptions, SkipPolicy};
use super::outcome::{TransferOutcome, TransferReport, TransferTracker};
use super::pipe::spawn_consumer;
use super::progress::{format_bytes, CountingWriter, Progress};
use super::prune::prune_directory;
use super::target::{apply_key_template, parse_download_source, resolve_format, RemoteTarget};
use super::workers::WorkerPool;
use crate::core::path::{is_within, normalize_slashes, relative_path};
use crate::core::{NexusError, NexusResult};
use crate::nexus::{RemoteAsset, RepositoryClient};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Downloads repository folders to local directories
pub struct Downloader {
    client: Arc<dyn RepositoryClient>,
    options: DownloadOptions,
}

impl Downloader {
    pub fn new(client: Arc<dyn RepositoryClient>, options: DownloadOptions) -> Self {
        Self { client, options }
    }

    /// Download `src` (`repository/folder[/archive]`) into `dest`.
    ///
    /// Fails with [`NexusError::NoAssetsFound`] when nothing matches the
    /// source. Per-asset failures are collected in the report.
    pub async fn download_folder(&self, src: &str, dest: &Path) -> NexusResult<TransferReport> {
        let src = apply_key_template(src, self.options.key_from.as_deref())?;
        if self.options.key_from.is_some() && !self.options.quiet {
            println!("Using key template: {}", src);
        }
        let target = parse_download_source(&src, self.options.compress)?;

        if self.options.compress {
            self.download_compressed(&target, dest).await
        } else {
            self.download_assets(&target, dest).await
        }
    }

    fn progress(&self, max_bytes: u64, total_files: usize, label: &str) -> Arc<Progress> {
        let visible = self.options.show_progress && !self.options.quiet && !self.options.dry_run;
        Progress::new(max_bytes, total_files, label, visible)
    }

    /// List the folder, falling back to an exact asset lookup when the
    /// listing is empty. Returns the assets and the base they are relative to.
    async fn enumerate(&self, target: &RemoteTarget) -> NexusResult<(Vec<RemoteAsset>, String)> {
        let assets = self
            .client
            .list_assets(&target.repository, &target.folder)
            .await?;
        debug!("listed {} assets under {}", assets.len(), target.display_path());
        if !assets.is_empty() || target.folder.is_empty() {
            return Ok((assets, target.folder.clone()));
        }

        match self
            .client
            .get_asset_by_path(&target.repository, &target.folder)
            .await
        {
            Ok(asset) => {
                let base = target
                    .folder
                    .rsplit_once('/')
                    .map(|(parent, _)| parent.to_string())
                    .unwrap_or_default();
                Ok((vec![asset], base))
            }
            Err(NexusError::AssetNotFound(_)) => Ok((Vec::new(), target.folder.clone())),
            Err(e) => Err(e),
        }
    }

    async fn download_assets(
        &self,
        target: &RemoteTarget,
        dest: &Path,
    ) -> NexusResult<TransferReport> {
        let (mut assets, base) = self.enumerate(target).await?;
        assets.retain(|asset| self.options.filter.matches(&relative_path(&asset.path, &base)));
        if assets.is_empty() {
            return Err(NexusError::NoAssetsFound {
                repository: target.repository.clone(),
                path: target.folder.clone(),
            });
        }

        let plan: Vec<(RemoteAsset, String)> = assets
            .into_iter()
            .map(|asset| {
                let local = if self.options.flatten {
                    relative_path(&asset.path, &base)
                } else {
                    asset.normalized_path()
                };
                (asset, local)
            })
            .collect();
        let keep: HashSet<String> = plan.iter().map(|(_, local)| local.clone()).collect();
        let total_bytes: u64 = plan.iter().map(|(asset, _)| asset.file_size).sum();

        if !self.options.quiet {
            println!(
                "Downloading {} files ({}) from {}",
                plan.len(),
                format_bytes(total_bytes),
                target.display_path()
            );
        }

        let tracker = TransferTracker::new();
        let progress = self.progress(total_bytes, plan.len(), "Downloading");
        let policy = self.options.skip_policy();
        let mut pool = WorkerPool::new(self.options.max_concurrent, &tracker);

        for (asset, local) in plan {
            let job = DownloadJob {
                client: Arc::clone(&self.client),
                dest: dest.to_path_buf(),
                progress: Arc::clone(&progress),
                policy,
                dry_run: self.options.dry_run,
            };
            pool.spawn(local.clone(), async move { job.run(asset, local).await })
                .await;
        }
        pool.finish().await;
        progress.finish();

        if self.options.delete_extra {
            if self.options.dry_run {
                if !self.options.quiet {
                    println!("Dry-run mode: --delete flag ignored (no files would be deleted)");
                }
            } else {
                let deleted = prune_directory(dest, &keep)?;
                if deleted > 0 {
                    info!("deleted {} extra files from {}", deleted, dest.display());
                }
                tracker.add_deleted(deleted);
            }
        }

        let report = tracker.report();
        if !self.options.quiet {
            for failure in report.failures() {
                if let TransferOutcome::Failed { path, error } = failure {
                    println!("✗ {}: {}", path, error);
                }
            }
        }
        Ok(report)
    }

    async fn download_compressed(
        &self,
        target: &RemoteTarget,
        dest: &Path,
    ) -> NexusResult<TransferReport> {
        let archive_name = target
            .require_archive_name(self.options.compress_format, "source")?
            .to_string();
        let format = resolve_format(self.options.compress_format, &archive_name);
        debug!("looking for archive {} ({})", archive_name, format);

        let assets = self
            .client
            .list_assets(&target.repository, &target.folder)
            .await?;
        let wanted = if target.folder.is_empty() {
            archive_name.clone()
        } else {
            format!("{}/{}", target.folder, archive_name)
        };
        let Some(asset) = assets
            .iter()
            .find(|asset| asset.normalized_path() == wanted)
            .cloned()
        else {
            if assets.is_empty() {
                return Err(NexusError::NoAssetsFound {
                    repository: target.repository.clone(),
                    path: target.folder.clone(),
                });
            }
            for candidate in &assets {
                debug!("available: {}", candidate.path);
            }
            return Err(NexusError::AssetNotFound(format!(
                "{}/{}",
                target.repository, wanted
            )));
        };

        let tracker = TransferTracker::new();
        if self.options.dry_run {
            if !self.options.quiet {
                println!(
                    "Dry-run mode: would download and extract {}/{} to {}",
                    target.repository,
                    wanted,
                    dest.display()
                );
            }
            tracker.record(TransferOutcome::Downloaded {
                path: wanted,
                bytes: 0,
            });
            return Ok(tracker.report());
        }

        if !self.options.quiet {
            println!(
                "Downloading archive {}/{} ({})",
                target.repository,
                wanted,
                format_bytes(asset.file_size)
            );
        }

        let progress = self.progress(asset.file_size, 1, "Downloading archive");
        let extract_root = dest.to_path_buf();
        let (pipe_writer, task) = spawn_consumer(move |reader| format.read(reader, &extract_root));
        let mut writer = CountingWriter::new(pipe_writer, Arc::clone(&progress));
        let fetched = self.client.download_asset(&asset.download_url, &mut writer).await;
        drop(writer);
        let extracted = task.wait().await;
        progress.file_done();
        progress.finish();

        let extracted = match extracted {
            Err(err @ NexusError::PathTraversal { .. }) => return Err(err),
            other => other,
        };
        match fetched.and_then(|bytes| extracted.map(|files| (bytes, files))) {
            Ok((bytes, files)) => {
                if !self.options.quiet {
                    println!("✓ Extracted {} files to {}", files, dest.display());
                }
                tracker.record(TransferOutcome::Downloaded {
                    path: wanted,
                    bytes,
                });
            }
            Err(e) => {
                if !self.options.quiet {
                    println!("✗ {}: {}", wanted, e);
                }
                tracker.record(TransferOutcome::Failed {
                    path: wanted,
                    error: e.to_string(),
                });
            }
        }
        Ok(tracker.report())
    }
}

/// Everything one download worker needs, owned so it can move into a task
struct DownloadJob {
    client: Arc<dyn RepositoryClient>,
    dest: PathBuf,
    progress: Arc<Progress>,
    policy: SkipPolicy,
    dry_run: bool,
}

impl DownloadJob {
    async fn run(self, asset: RemoteAsset, local: String) -> TransferOutcome {
        let target = self.dest.join(&local);
        if normalize_slashes(&local).is_empty() || !is_within(&self.dest, &target) {
            self.progress.file_done();
            return TransferOutcome::Failed {
                error: NexusError::UnsafeAssetPath {
                    path: asset.path.clone(),
                }
                .to_string(),
                path: local,
            };
        }

        let policy = self.policy;
        let checksums = asset.checksums.clone();
        let check_path = target.clone();
        let skip =
            match tokio::task::spawn_blocking(move || policy.check(&check_path, Some(&checksums)))
                .await
            {
                Ok(skip) => skip,
                Err(e) => {
                    warn!("skip check for {} did not complete, downloading: {}", local, e);
                    None
                }
            };
        if let Some(reason) = skip {
            debug!("skipping {} ({})", local, reason);
            self.progress.add(asset.file_size);
            self.progress.file_done();
            return TransferOutcome::Skipped {
                path: local,
                reason,
            };
        }

        if self.dry_run {
            info!("dry run: would download {}", local);
            self.progress.file_done();
            return TransferOutcome::Downloaded {
                path: local,
                bytes: 0,
            };
        }

        match self.fetch(&asset, &target).await {
            Ok(bytes) => {
                self.progress.file_done();
                TransferOutcome::Downloaded { path: local, bytes }
            }
            Err(e) => {
                warn!("download of {} failed: {}", asset.path, e);
                self.progress.file_done();
                TransferOutcome::Failed {
                    path: local,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn fetch(&self, asset: &RemoteAsset, target: &Path) -> NexusResult<u64> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| NexusError::filesystem(parent, e))?;
        }
        let file = tokio::fs::File::create(target)
            .await
            .map_err(|e| NexusError::filesystem(target, e))?;
        let mut writer = CountingWriter::new(file, Arc::clone(&self.progress));
        let bytes = self
            .client
            .download_asset(&asset.download_url, &mut writer)
            .await?;
        writer
            .flush()
            .await
            .map_err(|e| NexusError::filesystem(target, e))?;
        Ok(bytes)
    }
}
