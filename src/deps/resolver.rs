//! Turns manifest dependencies into locked `path -> alg:hex` entries.

use super::lock::LockFile;
use super::types::{Dependency, Manifest};
use crate::core::{NexusError, NexusResult};
use crate::nexus::{ClientFactory, RemoteAsset};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct Resolver {
    clients: Arc<dyn ClientFactory>,
    default_url: String,
    quiet: bool,
}

impl Resolver {
    /// `default_url` is used for dependencies without a `url` of their own.
    pub fn new(clients: Arc<dyn ClientFactory>, default_url: &str) -> Self {
        Self {
            clients,
            default_url: default_url.to_string(),
            quiet: true,
        }
    }

    /// Print a block per dependency while resolving the manifest.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.quiet = !verbose;
        self
    }

    /// Server URL a dependency resolves against.
    pub fn url_for<'a>(&'a self, dependency: &'a Dependency) -> &'a str {
        dependency.effective_url(&self.default_url)
    }

    /// Resolve one dependency to its locked files.
    pub async fn resolve_dependency(
        &self,
        dependency: &Dependency,
    ) -> NexusResult<BTreeMap<String, String>> {
        let client = self.clients.client_for(self.url_for(dependency))?;
        let expanded = dependency.expanded_path();

        let assets = if dependency.recursive {
            let prefix = expanded.trim_end_matches('/');
            let assets = client
                .search_assets(&dependency.repository, prefix)
                .await
                .map_err(|e| {
                    NexusError::Resolution(format!(
                        "failed to search assets for {}: {}",
                        dependency.name, e
                    ))
                })?;
            if assets.is_empty() {
                return Err(NexusError::Resolution(format!(
                    "no assets found for dependency {} at path {}",
                    dependency.name, expanded
                )));
            }
            assets
        } else {
            let asset = client
                .get_asset_by_path(&dependency.repository, &expanded)
                .await
                .map_err(|e| {
                    NexusError::Resolution(format!(
                        "failed to get asset for {}: {}",
                        dependency.name, e
                    ))
                })?;
            vec![asset]
        };
        debug!("{} resolved to {} assets", dependency.name, assets.len());

        assets
            .iter()
            .map(|asset| lock_entry(dependency, asset))
            .collect()
    }

    /// Resolve every dependency of `manifest` into a fresh lock file.
    pub async fn resolve_manifest(&self, manifest: &Manifest) -> NexusResult<LockFile> {
        let mut lock = LockFile::new();
        for (name, dependency) in &manifest.dependencies {
            if !self.quiet {
                println!();
                println!("[{}]", name);
                println!("  Repository: {}", dependency.repository);
                println!("  Path:       {}", dependency.expanded_path());
                println!("  Checksum:   {}", dependency.checksum);
            }
            let files = self.resolve_dependency(dependency).await?;
            if !self.quiet {
                println!("  ✓ Resolved {} file(s)", files.len());
            }
            lock.insert(name, files);
        }
        Ok(lock)
    }
}

fn lock_entry(dependency: &Dependency, asset: &RemoteAsset) -> NexusResult<(String, String)> {
    let algorithm = dependency.checksum;
    let path = asset.normalized_path();
    let digest = asset
        .checksums
        .get(algorithm)
        .ok_or_else(|| NexusError::ChecksumUnavailable {
            algorithm: algorithm.to_string(),
            subject: format!("asset {}", path),
        })?;
    Ok((path, format!("{}:{}", algorithm, digest)))
}
