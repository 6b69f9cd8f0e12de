use super::outcome::SkipReason;
use crate::archive::ArchiveFormat;
use crate::checksum::{ChecksumAlgorithm, Checksums, Validator};
use crate::filter::GlobFilter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Concurrent transfers when nothing else is configured
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Settings for one upload run
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Digest compared against the remote copy to decide skips
    pub checksum: ChecksumAlgorithm,
    /// Skip on existence alone
    pub skip_checksum: bool,
    /// Transfer everything, ignoring skip rules
    pub force: bool,
    pub dry_run: bool,
    pub filter: GlobFilter,
    /// Upload one archive instead of individual files
    pub compress: bool,
    /// Archive format; detected from the archive name when unset
    pub compress_format: Option<ArchiveFormat>,
    /// File whose sha256 replaces `{key}` in the destination
    pub key_from: Option<PathBuf>,
    pub max_concurrent: usize,
    pub quiet: bool,
    /// Draw progress bars (normally: stderr is a terminal and not quiet)
    pub show_progress: bool,
}

impl UploadOptions {
    pub fn skip_policy(&self) -> SkipPolicy {
        SkipPolicy {
            validator: Validator::new(self.checksum),
            skip_checksum: self.skip_checksum,
            force: self.force,
        }
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            checksum: ChecksumAlgorithm::default(),
            skip_checksum: false,
            force: false,
            dry_run: false,
            filter: GlobFilter::all(),
            compress: false,
            compress_format: None,
            key_from: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            quiet: false,
            show_progress: false,
        }
    }
}

/// Settings for one download run
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub checksum: ChecksumAlgorithm,
    pub skip_checksum: bool,
    pub force: bool,
    pub dry_run: bool,
    pub filter: GlobFilter,
    /// Strip the source folder from local paths
    pub flatten: bool,
    /// Remove local files that are absent remotely
    pub delete_extra: bool,
    /// Accepted for compatibility; folder listings always cover the subtree
    pub recursive: bool,
    pub compress: bool,
    pub compress_format: Option<ArchiveFormat>,
    pub key_from: Option<PathBuf>,
    pub max_concurrent: usize,
    pub quiet: bool,
    pub show_progress: bool,
}

impl DownloadOptions {
    pub fn skip_policy(&self) -> SkipPolicy {
        SkipPolicy {
            validator: Validator::new(self.checksum),
            skip_checksum: self.skip_checksum,
            force: self.force,
        }
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            checksum: ChecksumAlgorithm::default(),
            skip_checksum: false,
            force: false,
            dry_run: false,
            filter: GlobFilter::all(),
            flatten: false,
            delete_extra: false,
            recursive: false,
            compress: false,
            compress_format: None,
            key_from: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            quiet: false,
            show_progress: false,
        }
    }
}

/// Decides whether a unit with copies on both sides can be left alone
#[derive(Debug, Clone, Copy)]
pub struct SkipPolicy {
    validator: Validator,
    skip_checksum: bool,
    force: bool,
}

impl SkipPolicy {
    /// `local` is the file on disk; `remote` the digests of the repository copy,
    /// or `None` when there is no repository copy.
    ///
    /// A missing digest or unreadable file means the unit cannot be skipped.
    pub fn check(&self, local: &Path, remote: Option<&Checksums>) -> Option<SkipReason> {
        if self.force {
            return None;
        }
        let remote = remote?;
        if !local.is_file() {
            return None;
        }
        if self.skip_checksum {
            return Some(SkipReason::Exists);
        }
        match self.validator.validate(local, remote) {
            Ok(true) => Some(SkipReason::ChecksumMatch(self.validator.algorithm())),
            Ok(false) => None,
            Err(e) => {
                debug!("cannot skip {}: {}", local.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::digest_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn checksums_for(content: &[u8]) -> Checksums {
        Checksums {
            sha1: Some(digest_bytes(content, ChecksumAlgorithm::Sha1)),
            sha256: Some(digest_bytes(content, ChecksumAlgorithm::Sha256)),
            ..Default::default()
        }
    }

    #[test]
    fn test_skip_on_matching_digest() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, b"same").unwrap();

        let policy = DownloadOptions::default().skip_policy();
        assert_eq!(
            policy.check(&file, Some(&checksums_for(b"same"))),
            Some(SkipReason::ChecksumMatch(ChecksumAlgorithm::Sha1))
        );
        assert_eq!(policy.check(&file, Some(&checksums_for(b"other"))), None);
        assert_eq!(policy.check(&file, None), None);
    }

    #[test]
    fn test_missing_digest_cannot_skip() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, b"same").unwrap();

        let options = DownloadOptions {
            checksum: ChecksumAlgorithm::Sha512,
            ..Default::default()
        };
        assert_eq!(options.skip_policy().check(&file, Some(&checksums_for(b"same"))), None);
    }

    #[test]
    fn test_existence_only_and_force() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, b"local").unwrap();
        let remote = checksums_for(b"remote");

        let existence = UploadOptions {
            skip_checksum: true,
            ..Default::default()
        };
        assert_eq!(
            existence.skip_policy().check(&file, Some(&remote)),
            Some(SkipReason::Exists)
        );
        assert_eq!(
            existence.skip_policy().check(&temp.path().join("missing"), Some(&remote)),
            None
        );

        let forced = UploadOptions {
            skip_checksum: true,
            force: true,
            ..Default::default()
        };
        assert_eq!(forced.skip_policy().check(&file, Some(&remote)), None);
    }
}
