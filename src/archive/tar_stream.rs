use super::entry::{resolve_destination, write_entry, ArchiveEntry};
use crate::core::path::ensure_dir;
use crate::core::NexusResult;
use crate::filter::FileTransferUnit;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tar::{Archive, Builder, EntryType, Header};
use tracing::debug;

/// Append every unit to a tar stream and return the underlying writer.
///
/// Each file's content is copied straight from disk into the builder.
pub(crate) fn write_tar<W: Write>(dest: W, units: &[FileTransferUnit]) -> NexusResult<W> {
    let mut builder = Builder::new(dest);
    for unit in units {
        let entry = ArchiveEntry::from_unit(unit)?;
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(entry.size);
        header.set_mode(entry.mode);
        header.set_mtime(entry.mtime_secs());

        let file = File::open(&unit.absolute_path)?;
        // Bound the read to the header size in case the file grows mid-write.
        builder.append_data(&mut header, &entry.relative_path, file.take(entry.size))?;
    }
    Ok(builder.into_inner()?)
}

/// Extract a tar stream under `dest_dir`, entry by entry in archive order.
pub(crate) fn read_tar<R: Read>(source: R, dest_dir: &Path) -> NexusResult<usize> {
    ensure_dir(dest_dir)?;
    let mut archive = Archive::new(source);
    let mut extracted = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let target = resolve_destination(dest_dir, &name)?;

        let header = entry.header();
        let kind = header.entry_type();
        let mode = header.mode().ok();
        let mtime = header.mtime().ok();

        if kind.is_dir() {
            ensure_dir(&target)?;
            continue;
        }
        if !kind.is_file() {
            debug!("Skipping non-regular tar entry {} ({:?})", name, kind);
            continue;
        }

        write_entry(&mut entry, &target, mode)?;
        if let Some(secs) = mtime {
            restore_mtime(&target, secs);
        }
        extracted += 1;
    }

    Ok(extracted)
}

fn restore_mtime(path: &Path, secs: u64) {
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    let result = File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(modified));
    if let Err(e) = result {
        debug!("Could not restore mtime on {}: {}", path.display(), e);
    }
}
