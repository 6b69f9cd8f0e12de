use super::{GlobalArgs, TransferArgs};
use nexus_cli::core::{NexusError, NexusResult};
use nexus_cli::nexus::NexusClient;
use nexus_cli::transfer::{DownloadOptions, Downloader, TransferDirection};
use std::path::Path;
use std::sync::Arc;

/// Download-only flags
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadFlags {
    pub flatten: bool,
    pub delete_extra: bool,
    pub recursive: bool,
}

pub async fn run(
    global: &GlobalArgs,
    src: &str,
    dest: &Path,
    args: &TransferArgs,
    flags: DownloadFlags,
) -> NexusResult<()> {
    let config = global.config()?;
    let options = DownloadOptions {
        checksum: args.checksum(&config)?,
        skip_checksum: args.skip_checksum,
        force: args.force,
        dry_run: args.dry_run,
        filter: args.filter()?,
        flatten: flags.flatten,
        delete_extra: flags.delete_extra,
        recursive: flags.recursive,
        compress: args.compress,
        compress_format: args.compress_format()?,
        key_from: args.key_from.clone(),
        max_concurrent: config.max_concurrent,
        quiet: global.quiet,
        show_progress: global.show_progress(),
    };

    let client = Arc::new(NexusClient::new(&config.url, &config.username, &config.password)?);
    let report = Downloader::new(client, options)
        .download_folder(src, dest)
        .await?;

    if !global.quiet {
        println!("{}", report.summary.report_line(TransferDirection::Download));
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(NexusError::TransferFailed {
            failed: report.summary.failed,
        })
    }
}
