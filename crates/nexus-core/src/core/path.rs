use crate::core::error::{NexusError, NexusResult};
use std::path::{Component, Path, PathBuf};

/// Get the nexus-cli home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\nexus-cli
/// - Linux: ~/.config/nexus-cli
/// - macOS: ~/Library/Application Support/nexus-cli
pub fn nexus_home() -> NexusResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| NexusError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("nexus-cli"))
}

/// Get the config file path (`<nexus_home>/config.yaml`)
pub fn config_file() -> NexusResult<PathBuf> {
    Ok(nexus_home()?.join("config.yaml"))
}

/// Ensure a directory exists, creating it and its parents if needed
pub fn ensure_dir(path: &Path) -> NexusResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| NexusError::filesystem(path, e))?;
    }
    Ok(())
}

/// Trim leading slashes and collapse runs of `/` into one.
pub fn normalize_slashes(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of an asset relative to `base`.
///
/// Both sides are slash-normalized first. When `base` is a proper directory
/// prefix of the asset path it is stripped; otherwise the normalized asset
/// path is returned whole.
pub fn relative_path(asset_path: &str, base: &str) -> String {
    let path = normalize_slashes(asset_path);
    let base = normalize_slashes(base);
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(&base) {
        Some(rest) if rest.starts_with('/') => rest[1..].to_string(),
        _ => path,
    }
}

/// Split `repository/folder[/sub...]` into its repository and folder parts.
///
/// Returns `None` when there is no `/` separator. Trailing slashes are
/// removed from the folder.
pub fn parse_repository_path(arg: &str) -> Option<(String, String)> {
    let (repository, folder) = arg.split_once('/')?;
    Some((
        repository.to_string(),
        folder.trim_end_matches('/').to_string(),
    ))
}

/// Lexically clean a path: drop `.` components and fold `..` into its parent.
///
/// Does not touch the filesystem, so symlinks are not resolved.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Whether `candidate`, once cleaned, stays inside the cleaned `root`.
///
/// A root of `.` holds every relative path that does not climb out with `..`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    let root = clean_path(root);
    let candidate = clean_path(candidate);
    if root == Path::new(".") {
        return candidate.is_relative()
            && !matches!(candidate.components().next(), Some(Component::ParentDir));
    }
    candidate.starts_with(root)
}

/// Render a relative filesystem path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
