//! Common utilities for integration tests

use std::path::Path;
use std::process::Command;

/// `nexuscli` with its config directory redirected into `home` and pointed at
/// a server address that refuses connections.
pub fn nexus_command(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nexuscli"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("APPDATA", home.join("config"))
        .env("NEXUS_URL", "http://127.0.0.1:9")
        .env("NEXUS_USER", "admin")
        .env("NEXUS_PASS", "admin")
        .env_remove("RUST_LOG");
    cmd
}
