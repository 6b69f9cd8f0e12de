//! Parsing of `repository/folder[/archive]` arguments and `{key}` templates.

use crate::archive::ArchiveFormat;
use crate::checksum::{digest_file, ChecksumAlgorithm};
use crate::core::path::{normalize_slashes, parse_repository_path};
use crate::core::{NexusError, NexusResult};
use std::path::Path;

pub const KEY_PLACEHOLDER: &str = "{key}";

/// Replace `{key}` with the sha256 of `key_from`. Without `key_from`, the
/// target is returned unchanged.
pub fn apply_key_template(target: &str, key_from: Option<&Path>) -> NexusResult<String> {
    let Some(key_file) = key_from else {
        return Ok(target.to_string());
    };
    if !target.contains(KEY_PLACEHOLDER) {
        return Err(NexusError::Config(
            "when --key-from is specified, the path must contain the {key} template placeholder"
                .to_string(),
        ));
    }
    let key = digest_file(key_file, ChecksumAlgorithm::Sha256).map_err(|e| {
        NexusError::Config(format!(
            "failed to compute key from {}: {}",
            key_file.display(),
            e
        ))
    })?;
    Ok(target.replace(KEY_PLACEHOLDER, &key))
}

/// A parsed `repository[/folder][/archive]` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub repository: String,
    /// Folder inside the repository without surrounding slashes; may be empty
    pub folder: String,
    /// Trailing archive file name, only recognised in compressed mode
    pub archive_name: Option<String>,
}

impl RemoteTarget {
    /// `repository/folder` for messages.
    pub fn display_path(&self) -> String {
        if self.folder.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", self.repository, self.folder)
        }
    }

    /// Archive name or the error explaining that compressed mode needs one.
    pub fn require_archive_name(
        &self,
        format: Option<ArchiveFormat>,
        role: &str,
    ) -> NexusResult<&str> {
        self.archive_name.as_deref().ok_or_else(|| {
            let ext = format.unwrap_or_default().extension();
            NexusError::Config(format!(
                "when using --compress, you must specify the {ext} filename in the {role} path (e.g., repo/path/archive{ext})"
            ))
        })
    }
}

fn split_archive_name(folder: &str, compress: bool) -> (String, Option<String>) {
    if !compress || !ArchiveFormat::has_archive_extension(folder) {
        return (folder.to_string(), None);
    }
    match folder.rsplit_once('/') {
        Some((parent, name)) => (parent.to_string(), Some(name.to_string())),
        None => (String::new(), Some(folder.to_string())),
    }
}

/// Parse an upload destination. A bare repository name is allowed.
pub fn parse_upload_target(dest: &str, compress: bool) -> NexusResult<RemoteTarget> {
    let (repository, folder) = match parse_repository_path(dest) {
        Some((repository, folder)) => (repository, normalize_slashes(&folder)),
        None => (dest.to_string(), String::new()),
    };
    if repository.is_empty() {
        return Err(NexusError::Config(
            "The dest argument must be in the form 'repository' or 'repository/folder'".to_string(),
        ));
    }
    let (folder, archive_name) = split_archive_name(&folder, compress);
    Ok(RemoteTarget {
        repository,
        folder,
        archive_name,
    })
}

/// Parse a download source, which must name a folder inside a repository.
pub fn parse_download_source(src: &str, compress: bool) -> NexusResult<RemoteTarget> {
    let (repository, folder) = parse_repository_path(src)
        .filter(|(repository, _)| !repository.is_empty())
        .ok_or_else(|| {
            NexusError::Config(
                "The src argument must be in the form 'repository/folder' or 'repository/folder/subfolder'"
                    .to_string(),
            )
        })?;
    let (folder, archive_name) = split_archive_name(&normalize_slashes(&folder), compress);
    Ok(RemoteTarget {
        repository,
        folder,
        archive_name,
    })
}

/// Explicit format wins; otherwise detect from the archive name.
pub fn resolve_format(explicit: Option<ArchiveFormat>, archive_name: &str) -> ArchiveFormat {
    explicit.unwrap_or_else(|| ArchiveFormat::detect_from_filename(archive_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_key_template_substitution() {
        let temp = TempDir::new().unwrap();
        let key_file = temp.path().join("Cargo.lock");
        fs::write(&key_file, b"hello world").unwrap();

        let out = apply_key_template("builds/cache-{key}/", Some(&key_file)).unwrap();
        assert_eq!(
            out,
            "builds/cache-b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9/"
        );
    }

    #[test]
    fn test_key_template_requires_placeholder() {
        let temp = TempDir::new().unwrap();
        let key_file = temp.path().join("k");
        fs::write(&key_file, b"x").unwrap();
        let err = apply_key_template("builds/cache", Some(&key_file)).unwrap_err();
        assert!(err.to_string().contains("{key} template placeholder"));
    }

    #[test]
    fn test_key_template_without_key_file() {
        assert_eq!(apply_key_template("a/{key}", None).unwrap(), "a/{key}");
    }

    #[test]
    fn test_upload_target_forms() {
        let bare = parse_upload_target("libs", false).unwrap();
        assert_eq!(bare.repository, "libs");
        assert_eq!(bare.folder, "");

        let nested = parse_upload_target("libs/builds/1.0/", false).unwrap();
        assert_eq!(nested.folder, "builds/1.0");
        assert_eq!(nested.display_path(), "libs/builds/1.0");
        assert!(nested.archive_name.is_none());

        let archive = parse_upload_target("libs/builds/out.tar.zst", true).unwrap();
        assert_eq!(archive.folder, "builds");
        assert_eq!(archive.archive_name.as_deref(), Some("out.tar.zst"));

        // Archive suffix is only meaningful in compressed mode.
        let plain = parse_upload_target("libs/builds/out.tar.zst", false).unwrap();
        assert_eq!(plain.folder, "builds/out.tar.zst");

        let top = parse_upload_target("libs/out.zip", true).unwrap();
        assert_eq!(top.folder, "");
        assert_eq!(top.archive_name.as_deref(), Some("out.zip"));
    }

    #[test]
    fn test_require_archive_name_message() {
        let target = parse_upload_target("libs/builds", true).unwrap();
        let err = target
            .require_archive_name(Some(ArchiveFormat::Zstd), "destination")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: when using --compress, you must specify the .tar.zst filename in the destination path (e.g., repo/path/archive.tar.zst)"
        );
    }

    #[test]
    fn test_download_source_requires_folder() {
        assert!(parse_download_source("libs", false).is_err());
        assert!(parse_download_source("/docs", false).is_err());
        let src = parse_download_source("libs/test-folder", false).unwrap();
        assert_eq!(src.repository, "libs");
        assert_eq!(src.folder, "test-folder");
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format(None, "a.zip"), ArchiveFormat::Zip);
        assert_eq!(
            resolve_format(Some(ArchiveFormat::Gzip), "a.zip"),
            ArchiveFormat::Gzip
        );
    }
}
