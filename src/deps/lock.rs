//! Deterministic lock file: `dependencies: {name: {path: "alg:hex"}}`.

use crate::checksum::ChecksumRecord;
use crate::core::{NexusError, NexusResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Resolved files per dependency. Ordered maps keep serialization sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub dependencies: BTreeMap<String, BTreeMap<String, String>>,
}

impl LockFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved files of one dependency, replacing earlier entries.
    pub fn insert<I>(&mut self, name: &str, files: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.dependencies
            .insert(name.to_string(), files.into_iter().collect());
    }

    pub fn files(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.dependencies.get(name)
    }

    pub fn total_files(&self) -> usize {
        self.dependencies.values().map(BTreeMap::len).sum()
    }

    /// Parsed `alg:hex` records of one dependency, in path order.
    pub fn records(&self, name: &str) -> NexusResult<Vec<(String, ChecksumRecord)>> {
        let files = self.files(name).ok_or_else(|| {
            NexusError::Manifest(format!("dependency {} not found in lock file", name))
        })?;
        files
            .iter()
            .map(|(path, value)| Ok((path.clone(), value.parse::<ChecksumRecord>()?)))
            .collect()
    }

    pub fn to_yaml(&self) -> NexusResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> NexusResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| NexusError::Manifest(format!("invalid lock file: {}", e)))
    }

    pub fn load(path: &Path) -> NexusResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NexusError::Manifest(format!("failed to open {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn save(&self, path: &Path) -> NexusResult<()> {
        let content = self.to_yaml()?;
        fs::write(path, content).map_err(|e| NexusError::filesystem(path, e))
    }
}
