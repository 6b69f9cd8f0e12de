use crate::core::path::{clean_path, ensure_dir, is_within};
use crate::core::{NexusError, NexusResult};
use crate::filter::FileTransferUnit;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DEFAULT_FILE_MODE: u32 = 0o644;

/// Header data for one archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub relative_path: String,
    pub size: u64,
    pub mode: u32,
    pub mod_time: SystemTime,
}

impl ArchiveEntry {
    /// Read size, permission bits and modification time for a local file.
    pub fn from_unit(unit: &FileTransferUnit) -> NexusResult<Self> {
        let metadata = fs::metadata(&unit.absolute_path)?;
        Ok(Self {
            relative_path: unit.relative_path.clone(),
            size: metadata.len(),
            mode: file_mode(&metadata),
            mod_time: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    /// Seconds since the Unix epoch, clamped at zero.
    pub fn mtime_secs(&self) -> u64 {
        self.mod_time
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        DEFAULT_FILE_MODE
    }
}

/// Compute where an entry lands under `dest_root`.
///
/// Fails with [`NexusError::PathTraversal`] when the cleaned result is not
/// inside the cleaned destination root.
pub fn resolve_destination(dest_root: &Path, entry_name: &str) -> NexusResult<PathBuf> {
    let entry_path = Path::new(entry_name);
    let joined = dest_root.join(entry_path);
    if entry_path.has_root() || !is_within(dest_root, &joined) {
        return Err(NexusError::PathTraversal {
            path: entry_name.to_string(),
        });
    }
    Ok(clean_path(&joined))
}

/// Stream one regular file to `target`, creating parents, then restore its mode.
pub(crate) fn write_entry<R: Read + ?Sized>(
    reader: &mut R,
    target: &Path,
    mode: Option<u32>,
) -> NexusResult<u64> {
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    let mut out = File::create(target).map_err(|e| NexusError::filesystem(target, e))?;
    let written = io::copy(reader, &mut out).map_err(|e| NexusError::filesystem(target, e))?;
    drop(out);
    restore_mode(target, mode.unwrap_or(DEFAULT_FILE_MODE))?;
    Ok(written)
}

#[cfg(unix)]
fn restore_mode(path: &Path, mode: u32) -> NexusResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| NexusError::filesystem(path, e))
}

#[cfg(not(unix))]
fn restore_mode(_path: &Path, _mode: u32) -> NexusResult<()> {
    Ok(())
}
