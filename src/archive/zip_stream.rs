use super::entry::{resolve_destination, write_entry, ArchiveEntry};
use crate::core::path::ensure_dir;
use crate::core::{NexusError, NexusResult};
use crate::filter::FileTransferUnit;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn zip_error(e: zip::result::ZipError) -> NexusError {
    NexusError::Archive(format!("zip: {}", e))
}

/// Convert to the DOS timestamp zip stores; `None` outside 1980..=2107.
fn zip_time(time: SystemTime) -> Option<zip::DateTime> {
    let dt: DateTime<Utc> = time.into();
    let year = u16::try_from(dt.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
    )
    .ok()
}

/// Write a deflated zip stream.
///
/// Uses the streaming writer, so `dest` needs no `Seek`; sizes and CRCs go
/// into data descriptors after each member.
pub(crate) fn write_zip<W: Write>(dest: W, units: &[FileTransferUnit]) -> NexusResult<()> {
    let mut zip = ZipWriter::new_stream(dest);
    for unit in units {
        let entry = ArchiveEntry::from_unit(unit)?;
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(entry.mode & 0o777)
            .large_file(entry.size >= u32::MAX as u64);
        if let Some(modified) = zip_time(entry.mod_time) {
            options = options.last_modified_time(modified);
        }

        zip.start_file(entry.relative_path.as_str(), options)
            .map_err(zip_error)?;
        let mut file = File::open(&unit.absolute_path)?;
        io::copy(&mut (&mut file).take(entry.size), &mut zip)?;
    }
    zip.finish().map_err(zip_error)?;
    Ok(())
}

/// Extract a zip stream under `dest_dir`.
///
/// The member table lives at the end of a zip file, so the stream is spooled
/// to an anonymous temporary file first and then read in index order.
pub(crate) fn read_zip<R: Read>(mut source: R, dest_dir: &Path) -> NexusResult<usize> {
    ensure_dir(dest_dir)?;
    let mut spool = tempfile::tempfile()?;
    io::copy(&mut source, &mut spool)?;
    spool.seek(SeekFrom::Start(0))?;

    let mut archive = ZipArchive::new(spool).map_err(zip_error)?;
    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(zip_error)?;
        let name = file.name().to_string();
        let target = resolve_destination(dest_dir, &name)?;

        if file.is_dir() {
            ensure_dir(&target)?;
            continue;
        }
        let mode = file.unix_mode();
        write_entry(&mut file, &target, mode)?;
        extracted += 1;
    }
    Ok(extracted)
}
