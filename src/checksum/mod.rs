//! File digests and checksum validation.
//!
//! Supports the four digests a Nexus raw repository publishes for each asset:
//! sha1, sha256, sha512 and md5. Files are hashed as a stream, so memory use
//! does not depend on file size.

use crate::core::{NexusError, NexusResult};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used for skip decisions and lock file entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum ChecksumAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 4] = [
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Sha256,
        ChecksumAlgorithm::Sha512,
        ChecksumAlgorithm::Md5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" => Ok(ChecksumAlgorithm::Sha512),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            _ => Err(NexusError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Digests published by the repository for one asset. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

impl Checksums {
    /// Expected digest for `algorithm`, ignoring empty strings.
    pub fn get(&self, algorithm: ChecksumAlgorithm) -> Option<&str> {
        let value = match algorithm {
            ChecksumAlgorithm::Sha1 => self.sha1.as_deref(),
            ChecksumAlgorithm::Sha256 => self.sha256.as_deref(),
            ChecksumAlgorithm::Sha512 => self.sha512.as_deref(),
            ChecksumAlgorithm::Md5 => self.md5.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// A computed digest, written as `algorithm:hex` in lock files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub algorithm: ChecksumAlgorithm,
    pub hex_digest: String,
}

impl ChecksumRecord {
    pub fn new(algorithm: ChecksumAlgorithm, hex_digest: impl Into<String>) -> Self {
        Self {
            algorithm,
            hex_digest: hex_digest.into(),
        }
    }

    /// Case-insensitive comparison of the hex digests.
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.hex_digest.eq_ignore_ascii_case(actual_hex)
    }
}

impl fmt::Display for ChecksumRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex_digest)
    }
}

impl FromStr for ChecksumRecord {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, digest) = s
            .split_once(':')
            .ok_or_else(|| NexusError::Manifest(format!("invalid checksum format: {}", s)))?;
        if digest.is_empty() {
            return Err(NexusError::Manifest(format!("invalid checksum format: {}", s)));
        }
        Ok(Self::new(algorithm.parse()?, digest))
    }
}

enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    Md5(md5::Context),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
            ChecksumAlgorithm::Md5 => Hasher::Md5(md5::Context::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Md5(h) => h.consume(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha1(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
            Hasher::Md5(h) => format!("{:x}", h.compute()),
        }
    }
}

/// Hash everything `reader` yields, returning the lowercase hex digest.
pub fn digest_reader<R: Read>(mut reader: R, algorithm: ChecksumAlgorithm) -> io::Result<String> {
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}

/// Hash a file on disk.
pub fn digest_file(path: &Path, algorithm: ChecksumAlgorithm) -> NexusResult<String> {
    let file = File::open(path)?;
    Ok(digest_reader(file, algorithm)?)
}

/// Hash a byte slice.
pub fn digest_bytes(data: &[u8], algorithm: ChecksumAlgorithm) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize_hex()
}

/// Compares local files against repository digests with one fixed algorithm
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    algorithm: ChecksumAlgorithm,
}

impl Validator {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Whether the file at `path` matches the expected digest.
    ///
    /// Fails with [`NexusError::ChecksumUnavailable`] when `expected` carries
    /// no digest for this validator's algorithm.
    pub fn validate(&self, path: &Path, expected: &Checksums) -> NexusResult<bool> {
        let expected_hex =
            expected
                .get(self.algorithm)
                .ok_or_else(|| NexusError::ChecksumUnavailable {
                    algorithm: self.algorithm.to_string(),
                    subject: "validation".to_string(),
                })?;
        let actual = digest_file(path, self.algorithm)?;
        Ok(actual.eq_ignore_ascii_case(expected_hex))
    }
}
