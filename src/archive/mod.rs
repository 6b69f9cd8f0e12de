//! Streaming archive codecs: tar+gzip, tar+zstd and zip.
//!
//! Writers stream each file's header and bytes into the compressor, so memory
//! use is bounded by one copy buffer rather than by archive size. Readers
//! extract in archive order and refuse any member that would land outside the
//! destination root.

mod entry;
mod tar_stream;
mod zip_stream;

pub use entry::{resolve_destination, ArchiveEntry};

use crate::core::{NexusError, NexusResult};
use crate::filter::{collect_files, FileTransferUnit, GlobFilter};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

const ZSTD_LEVEL: i32 = 3;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    #[default]
    Gzip,
    Zstd,
    Zip,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 3] = [ArchiveFormat::Gzip, ArchiveFormat::Zstd, ArchiveFormat::Zip];

    /// Pick a format from an archive file name; anything unrecognised is gzip.
    pub fn detect_from_filename(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.zst") {
            ArchiveFormat::Zstd
        } else if lower.ends_with(".zip") {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::Gzip
        }
    }

    /// Whether `name` ends with one of the recognised archive extensions.
    pub fn has_archive_extension(name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        Self::ALL.iter().any(|f| lower.ends_with(f.extension()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Gzip => ".tar.gz",
            ArchiveFormat::Zstd => ".tar.zst",
            ArchiveFormat::Zip => ".zip",
        }
    }

    /// Archive every file under `source_dir` accepted by `filter` into `dest`.
    ///
    /// Returns the number of files written.
    pub fn write<W: Write>(
        &self,
        source_dir: &Path,
        dest: W,
        filter: &GlobFilter,
    ) -> NexusResult<usize> {
        let units = collect_files(source_dir, filter)?;
        self.write_units(&units, dest)?;
        Ok(units.len())
    }

    /// Archive an already enumerated file list into `dest`.
    pub fn write_units<W: Write>(&self, units: &[FileTransferUnit], dest: W) -> NexusResult<()> {
        match self {
            ArchiveFormat::Gzip => {
                let encoder = GzEncoder::new(dest, Compression::default());
                let mut inner = tar_stream::write_tar(encoder, units)?.finish()?;
                inner.flush()?;
            }
            ArchiveFormat::Zstd => {
                let encoder = zstd::stream::write::Encoder::new(dest, ZSTD_LEVEL)?;
                let mut inner = tar_stream::write_tar(encoder, units)?.finish()?;
                inner.flush()?;
            }
            ArchiveFormat::Zip => {
                zip_stream::write_zip(dest, units)?;
            }
        }
        Ok(())
    }

    /// Extract the archive read from `source` into `dest_dir`.
    ///
    /// Returns the number of regular files extracted. A member whose path
    /// escapes `dest_dir` aborts extraction with [`NexusError::PathTraversal`].
    pub fn read<R: Read>(&self, source: R, dest_dir: &Path) -> NexusResult<usize> {
        match self {
            ArchiveFormat::Gzip => tar_stream::read_tar(GzDecoder::new(source), dest_dir),
            ArchiveFormat::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(source)?;
                tar_stream::read_tar(decoder, dest_dir)
            }
            ArchiveFormat::Zip => zip_stream::read_zip(source, dest_dir),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArchiveFormat::Gzip => "gzip",
            ArchiveFormat::Zstd => "zstd",
            ArchiveFormat::Zip => "zip",
        })
    }
}

impl FromStr for ArchiveFormat {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(ArchiveFormat::Gzip),
            "zstd" | "zst" => Ok(ArchiveFormat::Zstd),
            "zip" => Ok(ArchiveFormat::Zip),
            _ => Err(NexusError::UnsupportedFormat(s.to_string())),
        }
    }
}
