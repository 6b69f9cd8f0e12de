//! Removal of local files that no longer have a remote counterpart.

use crate::core::path::to_slash;
use crate::core::{NexusError, NexusResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Delete every file under `root` whose slash-separated relative path is not
/// in `keep`, then remove directories left empty. Returns the number of files
/// deleted.
///
/// A missing `root` deletes nothing.
pub fn prune_directory(root: &Path, keep: &HashSet<String>) -> NexusResult<usize> {
    let deleted = delete_extra_files(root, keep)?;
    remove_empty_dirs(root)?;
    Ok(deleted)
}

/// Delete files under `root` that are absent from `keep`.
pub fn delete_extra_files(root: &Path, keep: &HashSet<String>) -> NexusResult<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let mut deleted = 0;
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => to_slash(rel),
            Err(_) => continue,
        };
        if keep.contains(&relative) {
            continue;
        }
        debug!("deleting extra file {}", entry.path().display());
        match fs::remove_file(entry.path()) {
            Ok(()) => deleted += 1,
            Err(e) => warn!("failed to delete {}: {}", entry.path().display(), e),
        }
    }
    Ok(deleted)
}

/// Remove empty directories below `root`, deepest first. `root` itself stays.
pub fn remove_empty_dirs(root: &Path) -> NexusResult<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let mut children =
            fs::read_dir(entry.path()).map_err(|e| NexusError::filesystem(entry.path(), e))?;
        if children.next().is_none() {
            debug!("removing empty directory {}", entry.path().display());
            fs::remove_dir(entry.path()).map_err(|e| NexusError::filesystem(entry.path(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}
