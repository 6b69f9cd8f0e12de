//! End-to-end tests: the `nexuscli` binary against a mock Nexus server.

use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::{MockServer, Request};

pub mod archive;
pub mod deps;
pub mod download;
pub mod upload;

pub const SEARCH_PATH: &str = "/service/rest/v1/search/assets";
pub const COMPONENTS_PATH: &str = "/service/rest/v1/components";

/// Test context that provides an isolated config directory and workspace
pub struct TestContext {
    pub temp: TempDir,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.child("config").path()).unwrap();
        Self { temp }
    }

    /// `nexuscli` talking to `server`, run from the temp directory
    pub fn nexus(&self, server: &MockServer) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("nexuscli").unwrap();
        cmd.current_dir(self.temp.path())
            .env("HOME", self.temp.path())
            .env("XDG_CONFIG_HOME", self.temp.child("config").path())
            .env("APPDATA", self.temp.child("config").path())
            .env("NEXUS_URL", server.uri())
            .env("NEXUS_USER", "admin")
            .env("NEXUS_PASS", "secret")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.child(relative).to_path_buf()
    }
}

/// Search API item for a raw asset served by `server`
pub fn asset_json(server: &MockServer, path: &str, checksum: Value, size: u64) -> Value {
    json!({
        "downloadUrl": format!("{}/repository/libs/{}", server.uri(), path),
        "path": path,
        "id": format!("id-{}", path),
        "repository": "libs",
        "format": "raw",
        "checksum": checksum,
        "contentType": "application/octet-stream",
        "fileSize": size
    })
}

pub fn page(items: Vec<Value>) -> Value {
    json!({ "items": items, "continuationToken": null })
}

/// Content of the file part of a multipart request body
pub fn file_part(request: &Request) -> Vec<u8> {
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let boundary = content_type.split("boundary=").nth(1).unwrap();
    let body = &request.body;

    let disposition = find(body, b"filename=\"").unwrap();
    let start = disposition + find(&body[disposition..], b"\r\n\r\n").unwrap() + 4;
    let closing = format!("\r\n--{}", boundary);
    let end = start + find(&body[start..], closing.as_bytes()).unwrap();
    body[start..end].to_vec()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
