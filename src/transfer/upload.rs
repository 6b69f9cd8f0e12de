//! Directory upload, per file or as one streamed archive.

use super::options::{SkipPolicy, UploadOptions};
use super::outcome::{TransferOutcome, TransferReport, TransferTracker};
use super::pipe::{spawn_producer, PipeWriter};
use super::progress::{format_bytes, CountingWriter, Progress};
use super::target::{apply_key_template, parse_upload_target, resolve_format, RemoteTarget};
use super::workers::WorkerPool;
use crate::core::path::relative_path;
use crate::core::NexusResult;
use crate::filter::{collect_files, total_size, FileTransferUnit};
use crate::nexus::multipart::{content_type, new_boundary, MultipartWriter};
use crate::nexus::{RemoteAsset, RepositoryClient};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Write buffer between the multipart encoder and the pipe
const PIPE_BUFFER: usize = 64 * 1024;

/// Uploads local directories into a repository
pub struct Uploader {
    client: Arc<dyn RepositoryClient>,
    options: UploadOptions,
}

impl Uploader {
    pub fn new(client: Arc<dyn RepositoryClient>, options: UploadOptions) -> Self {
        Self { client, options }
    }

    /// Upload the files under `source` to `dest` (`repository[/folder][/archive]`).
    ///
    /// Per-file failures are collected in the report; configuration problems
    /// and enumeration errors are returned before anything is sent.
    pub async fn upload_directory(&self, source: &Path, dest: &str) -> NexusResult<TransferReport> {
        let dest = apply_key_template(dest, self.options.key_from.as_deref())?;
        if self.options.key_from.is_some() && !self.options.quiet {
            println!("Using key template: {}", dest);
        }
        let target = parse_upload_target(&dest, self.options.compress)?;

        if self.options.compress {
            self.upload_compressed(source, &target).await
        } else {
            self.upload_files(source, &target).await
        }
    }

    fn progress(&self, max_bytes: u64, total_files: usize, label: &str) -> Arc<Progress> {
        let visible = self.options.show_progress && !self.options.quiet && !self.options.dry_run;
        Progress::new(max_bytes, total_files, label, visible)
    }

    /// Remote assets under the target folder keyed by their path inside it.
    async fn remote_index(&self, target: &RemoteTarget) -> HashMap<String, RemoteAsset> {
        if self.options.force {
            return HashMap::new();
        }
        match self
            .client
            .list_assets(&target.repository, &target.folder)
            .await
        {
            Ok(assets) => assets
                .into_iter()
                .map(|asset| (relative_path(&asset.path, &target.folder), asset))
                .collect(),
            Err(e) => {
                warn!(
                    "could not list {}; uploading everything: {}",
                    target.display_path(),
                    e
                );
                HashMap::new()
            }
        }
    }

    async fn upload_files(
        &self,
        source: &Path,
        target: &RemoteTarget,
    ) -> NexusResult<TransferReport> {
        let units = collect_files(source, &self.options.filter)?;
        let tracker = Arc::new(TransferTracker::new());
        if units.is_empty() {
            warn!("no files to upload in {}", source.display());
            return Ok(tracker.report());
        }

        let total_bytes = total_size(&units);
        if !self.options.quiet {
            println!(
                "Uploading {} files ({}) to {}",
                units.len(),
                format_bytes(total_bytes),
                target.display_path()
            );
        }

        let remote = Arc::new(self.remote_index(target).await);
        let progress = self.progress(total_bytes, units.len(), "Uploading");
        let policy = self.options.skip_policy();
        let mut pool = WorkerPool::new(self.options.max_concurrent, &tracker);

        for unit in units {
            let job = UploadJob {
                client: Arc::clone(&self.client),
                repository: target.repository.clone(),
                folder: target.folder.clone(),
                remote: Arc::clone(&remote),
                progress: Arc::clone(&progress),
                policy,
                dry_run: self.options.dry_run,
            };
            pool.spawn(unit.relative_path.clone(), async move { job.run(unit).await })
                .await;
        }
        pool.finish().await;
        progress.finish();

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

    async fn upload_compressed(
        &self,
        source: &Path,
        target: &RemoteTarget,
    ) -> NexusResult<TransferReport> {
        let archive_name = target
            .require_archive_name(self.options.compress_format, "destination")?
            .to_string();
        let format = resolve_format(self.options.compress_format, &archive_name);
        let units = collect_files(source, &self.options.filter)?;
        let total_bytes = total_size(&units);
        let remote_path = if target.folder.is_empty() {
            archive_name.clone()
        } else {
            format!("{}/{}", target.folder, archive_name)
        };

        let tracker = TransferTracker::new();
        if !self.options.quiet {
            println!(
                "Compressing {} files ({}) into {}/{} ({})",
                units.len(),
                format_bytes(total_bytes),
                target.repository,
                remote_path,
                format
            );
        }
        if self.options.dry_run {
            info!("dry run: would upload archive {}", remote_path);
            tracker.record(TransferOutcome::Uploaded {
                path: remote_path,
                bytes: 0,
            });
            return Ok(tracker.report());
        }

        let progress = self.progress(total_bytes, 1, "Uploading archive");
        let boundary = new_boundary();
        let header = content_type(&boundary);
        let folder = target.folder.clone();
        let producer_progress = Arc::clone(&progress);

        let (reader, task) = spawn_producer(move |writer: &mut PipeWriter| {
            let buffered = BufWriter::with_capacity(PIPE_BUFFER, writer);
            let mut form = MultipartWriter::new(buffered, boundary);
            form.begin_file("raw.asset1", &archive_name)?;
            format.write_units(&units, CountingWriter::new(&mut form, producer_progress))?;
            form.text("raw.asset1.filename", &archive_name)?;
            if !folder.is_empty() {
                form.text("raw.directory", &folder)?;
            }
            form.finish()?.flush()?;
            Ok(())
        });

        let sent = self
            .client
            .upload_component(&target.repository, reader.into_stream(), &header)
            .await;
        let produced = task.wait().await;
        progress.file_done();
        progress.finish();

        match sent.and(produced) {
            Ok(()) => tracker.record(TransferOutcome::Uploaded {
                path: remote_path,
                bytes: total_bytes,
            }),
            Err(e) => {
                if !self.options.quiet {
                    println!("✗ {}: {}", remote_path, e);
                }
                tracker.record(TransferOutcome::Failed {
                    path: remote_path,
                    error: e.to_string(),
                });
            }
        }
        Ok(tracker.report())
    }
}

/// Everything one upload worker needs, owned so it can move into a task
struct UploadJob {
    client: Arc<dyn RepositoryClient>,
    repository: String,
    folder: String,
    remote: Arc<HashMap<String, RemoteAsset>>,
    progress: Arc<Progress>,
    policy: SkipPolicy,
    dry_run: bool,
}

impl UploadJob {
    async fn run(self, unit: FileTransferUnit) -> TransferOutcome {
        let path = unit.relative_path.clone();
        let remote = self.remote.get(&path).map(|asset| asset.checksums.clone());
        let local = unit.absolute_path.clone();
        let policy = self.policy;
        let skip = match tokio::task::spawn_blocking(move || policy.check(&local, remote.as_ref()))
            .await
        {
            Ok(skip) => skip,
            Err(e) => {
                warn!("skip check for {} did not complete, uploading: {}", path, e);
                None
            }
        };

        if let Some(reason) = skip {
            debug!("skipping {} ({})", path, reason);
            self.progress.add(unit.size_bytes);
            self.progress.file_done();
            return TransferOutcome::Skipped { path, reason };
        }

        if self.dry_run {
            info!("dry run: would upload {}", path);
            self.progress.file_done();
            return TransferOutcome::Uploaded { path, bytes: 0 };
        }

        match self.send(&unit).await {
            Ok(()) => {
                self.progress.file_done();
                TransferOutcome::Uploaded {
                    path,
                    bytes: unit.size_bytes,
                }
            }
            Err(e) => {
                warn!("upload of {} failed: {}", path, e);
                self.progress.file_done();
                TransferOutcome::Failed {
                    path,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Stream one file as a single-asset multipart component.
    async fn send(&self, unit: &FileTransferUnit) -> NexusResult<()> {
        let boundary = new_boundary();
        let header = content_type(&boundary);
        let source = unit.absolute_path.clone();
        let relative = unit.relative_path.clone();
        let file_name = relative.rsplit('/').next().unwrap_or(&relative).to_string();
        let folder = self.folder.clone();
        let progress = Arc::clone(&self.progress);

        let (reader, task) = spawn_producer(move |writer: &mut PipeWriter| {
            let mut file = File::open(&source)?;
            let buffered = BufWriter::with_capacity(PIPE_BUFFER, writer);
            let mut form = MultipartWriter::new(buffered, boundary);
            form.begin_file("raw.asset1", &file_name)?;
            io::copy(&mut file, &mut CountingWriter::new(&mut form, progress))?;
            form.text("raw.asset1.filename", &relative)?;
            if !folder.is_empty() {
                form.text("raw.directory", &folder)?;
            }
            form.finish()?.flush()?;
            Ok(())
        });

        let sent = self
            .client
            .upload_component(&self.repository, reader.into_stream(), &header)
            .await;
        let produced = task.wait().await;
        sent.and(produced)
    }
}
