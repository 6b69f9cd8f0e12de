//! `deps.ini` parsing with strict key checking.

use super::types::{Defaults, Dependency, Manifest};
use crate::checksum::ChecksumAlgorithm;
use crate::core::path::clean_path;
use crate::core::{NexusError, NexusResult};
use ini::{Ini, ParseOption, Properties};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

const DEFAULTS_SECTION: &str = "defaults";
const DEFAULTS_KEYS: &[&str] = &["url", "repository", "checksum", "output_dir"];
const DEPENDENCY_KEYS: &[&str] = &[
    "repository",
    "path",
    "version",
    "checksum",
    "output_dir",
    "dest",
    "recursive",
    "url",
];

/// Read and parse a manifest file.
pub fn parse_manifest_file(path: &Path) -> NexusResult<Manifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        NexusError::Manifest(format!("failed to open {}: {}", path.display(), e))
    })?;
    parse_manifest(&content)
}

/// Parse manifest text into defaults plus dependencies.
pub fn parse_manifest(content: &str) -> NexusResult<Manifest> {
    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(content, options)
        .map_err(|e| NexusError::Manifest(format!("invalid manifest syntax: {}", e)))?;

    let mut defaults = Defaults::default();
    let mut sections: Vec<(&str, &Properties)> = Vec::new();
    for (section, properties) in ini.iter() {
        match section {
            None => {
                if let Some((key, _)) = properties.iter().next() {
                    return Err(NexusError::Manifest(format!(
                        "key '{}' appears before any section",
                        key
                    )));
                }
            }
            Some(DEFAULTS_SECTION) => apply_defaults(&mut defaults, properties)?,
            Some(name) => sections.push((name, properties)),
        }
    }

    let mut dependencies = BTreeMap::new();
    for (name, properties) in sections {
        let dependency = build_dependency(name, properties, &defaults)?;
        if dependencies.insert(name.to_string(), dependency).is_some() {
            return Err(NexusError::Manifest(format!(
                "dependency {} is declared more than once",
                name
            )));
        }
    }

    Ok(Manifest {
        defaults,
        dependencies,
    })
}

fn check_key(key: &str, allowed: &[&str], section: &str) -> NexusResult<()> {
    if allowed.contains(&key) {
        Ok(())
    } else {
        Err(NexusError::UnknownKey {
            key: key.to_string(),
            section: section.to_string(),
        })
    }
}

fn parse_checksum(value: &str, section: &str) -> NexusResult<ChecksumAlgorithm> {
    value.parse().map_err(|e: NexusError| {
        NexusError::Manifest(format!("invalid checksum in [{}]: {}", section, e))
    })
}

fn apply_defaults(defaults: &mut Defaults, properties: &Properties) -> NexusResult<()> {
    for (key, value) in properties.iter() {
        check_key(key, DEFAULTS_KEYS, DEFAULTS_SECTION)?;
        match key {
            "url" => defaults.url = non_empty(value),
            "repository" => defaults.repository = non_empty(value),
            "checksum" => defaults.checksum = parse_checksum(value, DEFAULTS_SECTION)?,
            "output_dir" => {
                validate_output_dir(value).map_err(|reason| {
                    NexusError::Manifest(format!("invalid output_dir in [defaults]: {}", reason))
                })?;
                defaults.output_dir = value.to_string();
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_dependency(
    name: &str,
    properties: &Properties,
    defaults: &Defaults,
) -> NexusResult<Dependency> {
    let mut repository = defaults.repository.clone();
    let mut path = None;
    let mut version = String::new();
    let mut checksum = defaults.checksum;
    let mut output_dir = defaults.output_dir.clone();
    let mut dest = None;
    let mut recursive = false;
    let mut url = defaults.url.clone();

    for (key, value) in properties.iter() {
        check_key(key, DEPENDENCY_KEYS, name)?;
        match key {
            "repository" => repository = non_empty(value),
            "path" => path = non_empty(value),
            "version" => version = value.to_string(),
            "checksum" => checksum = parse_checksum(value, name)?,
            "output_dir" => {
                validate_output_dir(value).map_err(|reason| {
                    NexusError::Manifest(format!("invalid output_dir in [{}]: {}", name, reason))
                })?;
                output_dir = value.to_string();
            }
            "dest" => dest = non_empty(value),
            "recursive" => recursive = value.eq_ignore_ascii_case("true"),
            "url" => url = non_empty(value),
            _ => {}
        }
    }

    let path = path.ok_or_else(|| {
        NexusError::Manifest(format!(
            "dependency {} is missing required 'path' field",
            name
        ))
    })?;
    let repository = repository.ok_or_else(|| {
        NexusError::Manifest(format!(
            "dependency {} is missing 'repository' (not set in defaults or dependency)",
            name
        ))
    })?;

    Ok(Dependency {
        name: name.to_string(),
        repository,
        path,
        version,
        checksum,
        output_dir,
        dest,
        recursive,
        url,
    })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Reject output directories that would make cleanup touch the working
/// directory or the filesystem root.
pub fn validate_output_dir(dir: &str) -> Result<(), String> {
    if dir.trim().is_empty() {
        return Err("output_dir cannot be empty".to_string());
    }
    let cleaned = clean_path(Path::new(dir));
    let mut components = cleaned.components();
    match (components.next(), components.next()) {
        (Some(Component::CurDir), None) => {
            Err("output_dir cannot be '.' (current directory) for safety reasons".to_string())
        }
        (Some(Component::RootDir), None) => {
            Err("output_dir cannot be '/' (root directory) for safety reasons".to_string())
        }
        _ => Ok(()),
    }
}
