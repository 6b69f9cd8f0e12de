//! Dependency manifests (`deps.ini`) and their lock files.

pub mod env;
pub mod lock;
pub mod parser;
pub mod resolver;
pub mod sync;
pub mod template;
pub mod types;

pub use lock::LockFile;
pub use parser::{parse_manifest, parse_manifest_file};
pub use resolver::Resolver;
pub use sync::{SyncOptions, SyncReport, Syncer};
pub use types::{Defaults, Dependency, Manifest, ENV_FILE, LOCK_FILE, MANIFEST_FILE};
