pub mod deps;
pub mod download;
pub mod upload;

use clap::Args;
use nexus_cli::archive::ArchiveFormat;
use nexus_cli::checksum::ChecksumAlgorithm;
use nexus_cli::config::Config;
use nexus_cli::core::NexusResult;
use nexus_cli::filter::GlobFilter;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Connection and output settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub quiet: bool,
}

impl GlobalArgs {
    /// Config file values with environment and flag overrides applied.
    pub fn config(&self) -> NexusResult<Config> {
        Ok(Config::load()?.with_overrides(
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
        ))
    }

    /// Progress bars only make sense on an interactive stderr.
    pub fn show_progress(&self) -> bool {
        !self.quiet && std::io::stderr().is_terminal()
    }
}

/// Flags common to upload and download
#[derive(Args, Debug, Clone, Default)]
pub struct TransferArgs {
    /// Checksum algorithm to use for validation (sha1, sha256, sha512, md5)
    #[arg(short, long)]
    pub checksum: Option<String>,

    /// Skip checksum validation and compare on file existence only
    #[arg(short, long)]
    pub skip_checksum: bool,

    /// Transfer all files regardless of existence or checksum match
    #[arg(long)]
    pub force: bool,

    /// Show what would be transferred without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Transfer the files as one compressed archive
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Archive format: gzip (default), zstd or zip
    #[arg(long)]
    pub compress_format: Option<String>,

    /// Glob pattern(s) to filter files (e.g. '**/*.go,!**/*_test.go')
    #[arg(short, long)]
    pub glob: Option<String>,

    /// File whose sha256 replaces {key} in the remote path
    #[arg(long)]
    pub key_from: Option<PathBuf>,
}

impl TransferArgs {
    /// Flag value, else the configured default.
    pub fn checksum(&self, config: &Config) -> NexusResult<ChecksumAlgorithm> {
        match &self.checksum {
            Some(name) => name.parse(),
            None => config.checksum_algorithm(),
        }
    }

    pub fn compress_format(&self) -> NexusResult<Option<ArchiveFormat>> {
        self.compress_format.as_deref().map(str::parse).transpose()
    }

    pub fn filter(&self) -> NexusResult<GlobFilter> {
        GlobFilter::parse(self.glob.as_deref())
    }
}
