use crate::checksum::ChecksumAlgorithm;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const MANIFEST_FILE: &str = "deps.ini";
pub const LOCK_FILE: &str = "deps-lock.yaml";
pub const ENV_FILE: &str = "deps.env";

/// Placeholder in a dependency path replaced by its version
pub const VERSION_PLACEHOLDER: &str = "${version}";

/// Values from `[defaults]`, inherited by every dependency that leaves them unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub url: Option<String>,
    pub repository: Option<String>,
    pub checksum: ChecksumAlgorithm,
    pub output_dir: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            url: None,
            repository: None,
            checksum: ChecksumAlgorithm::Sha256,
            output_dir: "./local".to_string(),
        }
    }
}

/// One named remote artifact, with defaults already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub repository: String,
    /// Remote path, possibly containing `${version}`
    pub path: String,
    pub version: String,
    pub checksum: ChecksumAlgorithm,
    pub output_dir: String,
    /// Local path overriding `output_dir/<expanded path>`
    pub dest: Option<String>,
    /// Resolve every asset under the path instead of a single file
    pub recursive: bool,
    pub url: Option<String>,
}

impl Dependency {
    /// The remote path with `${version}` substituted.
    pub fn expanded_path(&self) -> String {
        expand_version(&self.path, &self.version)
    }

    /// Where the dependency lands locally.
    pub fn local_path(&self) -> PathBuf {
        match &self.dest {
            Some(dest) => PathBuf::from(dest),
            None => PathBuf::from(&self.output_dir).join(self.expanded_path()),
        }
    }

    /// Server URL for this dependency, falling back to the configured one.
    pub fn effective_url<'a>(&'a self, configured: &'a str) -> &'a str {
        self.url.as_deref().unwrap_or(configured)
    }

    /// `repository/path` argument for a folder download.
    pub fn download_source(&self) -> String {
        let path = self.expanded_path();
        format!("{}/{}", self.repository, path.trim_matches('/'))
    }
}

/// Parsed `deps.ini`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub defaults: Defaults,
    pub dependencies: BTreeMap<String, Dependency>,
}

pub fn expand_version(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// Environment variable stem for a dependency name: upper case, `-` as `_`.
pub fn env_stem(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}
