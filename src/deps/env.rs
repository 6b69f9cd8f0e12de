use super::types::{env_stem, Manifest};
use crate::core::{NexusError, NexusResult};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Render `DEPS_<NAME>_{NAME,VERSION,PATH}` assignments, one block per
/// dependency in name order.
pub fn render_env(manifest: &Manifest) -> String {
    let mut out = String::new();
    for (name, dependency) in &manifest.dependencies {
        let stem = env_stem(name);
        let _ = writeln!(out, "DEPS_{}_NAME=\"{}\"", stem, name);
        let _ = writeln!(out, "DEPS_{}_VERSION=\"{}\"", stem, dependency.version);
        let _ = writeln!(
            out,
            "DEPS_{}_PATH=\"{}\"",
            stem,
            dependency.local_path().display()
        );
        out.push('\n');
    }
    out
}

pub fn write_env_file(path: &Path, manifest: &Manifest) -> NexusResult<()> {
    fs::write(path, render_env(manifest)).map_err(|e| NexusError::filesystem(path, e))
}
