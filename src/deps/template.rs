use crate::core::{NexusError, NexusResult};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Starter manifest written by `deps init`
pub const MANIFEST_TEMPLATE: &str = "[defaults]
url = http://localhost:8081
repository = libs
checksum = sha256
output_dir = ./local

[example_txt]
path = docs/example-${version}.txt
version = 1.0.0

[libfoo_tar]
path = thirdparty/libfoo-${version}.tar.gz
version = 1.2.3
checksum = sha512

[docs_folder]
path = docs/${version}/
version = 2025-10-15
recursive = true
";

/// Write the starter manifest to `path`. An existing file is left untouched.
pub fn create_template(path: &Path) -> NexusResult<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(NexusError::Config(format!(
                "{} already exists",
                path.display()
            )))
        }
        Err(e) => return Err(NexusError::filesystem(path, e)),
    };
    file.write_all(MANIFEST_TEMPLATE.as_bytes())
        .map_err(|e| NexusError::filesystem(path, e))
}
