use super::{GlobalArgs, TransferArgs};
use nexus_cli::core::{NexusError, NexusResult};
use nexus_cli::nexus::NexusClient;
use nexus_cli::transfer::{TransferDirection, UploadOptions, Uploader};
use std::path::Path;
use std::sync::Arc;

pub async fn run(global: &GlobalArgs, src: &Path, dest: &str, args: &TransferArgs) -> NexusResult<()> {
    let config = global.config()?;
    let options = UploadOptions {
        checksum: args.checksum(&config)?,
        skip_checksum: args.skip_checksum,
        force: args.force,
        dry_run: args.dry_run,
        filter: args.filter()?,
        compress: args.compress,
        compress_format: args.compress_format()?,
        key_from: args.key_from.clone(),
        max_concurrent: config.max_concurrent,
        quiet: global.quiet,
        show_progress: global.show_progress(),
    };
    if !src.is_dir() {
        return Err(NexusError::Config(format!(
            "source '{}' is not a directory",
            src.display()
        )));
    }

    let client = Arc::new(NexusClient::new(&config.url, &config.username, &config.password)?);
    let report = Uploader::new(client, options)
        .upload_directory(src, dest)
        .await?;

    if !global.quiet {
        println!("{}", report.summary.report_line(TransferDirection::Upload));
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(NexusError::TransferFailed {
            failed: report.summary.failed,
        })
    }
}
