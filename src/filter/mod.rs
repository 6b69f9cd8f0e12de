//! Glob filtering and local file enumeration.
//!
//! Patterns use `**`-aware glob syntax where `*` never crosses a `/`.
//! A pattern list is comma separated; entries starting with `!` exclude.

use crate::core::path::to_slash;
use crate::core::{NexusError, NexusResult};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Include/exclude glob filter applied to slash-separated relative paths
#[derive(Debug, Clone)]
pub struct GlobFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl GlobFilter {
    /// Filter that accepts every path
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    /// Parse a comma-separated pattern list.
    ///
    /// An empty or absent list matches everything. A malformed pattern fails
    /// with [`NexusError::InvalidPattern`] naming that pattern.
    pub fn parse(patterns: Option<&str>) -> NexusResult<Self> {
        let Some(patterns) = patterns else {
            return Ok(Self::all());
        };

        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for raw in patterns.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.strip_prefix('!') {
                Some(negated) if !negated.is_empty() => exclude.push(compile(negated)?),
                Some(_) => {}
                None => include.push(compile(raw)?),
            }
        }

        Ok(Self {
            include: build_set(include, patterns)?,
            exclude: build_set(exclude, patterns)?,
        })
    }

    /// Whether a relative path passes the filter.
    ///
    /// Backslashes are treated as separators so Windows-style paths behave the
    /// same as slash paths.
    pub fn matches(&self, relative_path: &str) -> bool {
        let normalized = relative_path.replace('\\', "/");
        let included = self
            .include
            .as_ref()
            .map_or(true, |set| set.is_match(&normalized));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(&normalized));
        included && !excluded
    }
}

impl Default for GlobFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn compile(pattern: &str) -> NexusResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| NexusError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

fn build_set(globs: Vec<Glob>, source: &str) -> NexusResult<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| NexusError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}

/// One local file selected for transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferUnit {
    pub absolute_path: PathBuf,
    /// Slash-separated path relative to the enumeration root
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Enumerate regular files under `base` that pass `filter`.
///
/// Order is the directory walk order with entries sorted by file name, so
/// repeated runs over the same tree yield the same sequence.
pub fn collect_files(base: &Path, filter: &GlobFilter) -> NexusResult<Vec<FileTransferUnit>> {
    if !base.is_dir() {
        return Err(NexusError::Path(format!(
            "'{}' is not a directory",
            base.display()
        )));
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|e| NexusError::Path(e.to_string()))?;
        let relative_path = to_slash(relative);
        if !filter.matches(&relative_path) {
            continue;
        }
        units.push(FileTransferUnit {
            absolute_path: entry.path().to_path_buf(),
            relative_path,
            size_bytes: entry.metadata()?.len(),
        });
    }
    Ok(units)
}

/// Sum of unit sizes, used as the progress estimate.
pub fn total_size(units: &[FileTransferUnit]) -> u64 {
    units.iter().map(|u| u.size_bytes).sum()
}
