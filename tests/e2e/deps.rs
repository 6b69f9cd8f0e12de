use super::*;
use nexus_cli::deps::LockFile;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const MANIFEST: &str = "[defaults]\nrepository = libs\nchecksum = sha256\noutput_dir = ./local\n\n\
[example_txt]\npath = docs/example-${version}.txt\nversion = 1.0.0\n";

// sha256 of "hello\n"
const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

#[tokio::test(flavor = "multi_thread")]
async fn test_deps_lock_records_published_digest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", "/docs/example-1.0.0.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![asset_json(
            &server,
            "docs/example-1.0.0.txt",
            json!({"sha1": "aa", "sha256": "f6a4e3c9b12"}),
            6,
        )])))
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("deps.ini").write_str(MANIFEST).unwrap();

    ctx.nexus(&server)
        .args(["deps", "lock"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved 1 file(s)"));

    let lock = LockFile::load(&ctx.path("deps-lock.yaml")).unwrap();
    let files = lock.files("example_txt").unwrap();
    assert_eq!(
        files.get("docs/example-1.0.0.txt").map(String::as_str),
        Some("sha256:f6a4e3c9b12")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deps_sync_downloads_and_verifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![asset_json(
            &server,
            "docs/example-1.0.0.txt",
            json!({"sha256": HELLO_SHA256}),
            6,
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/example-1.0.0.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello\n"))
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("deps.ini").write_str(MANIFEST).unwrap();
    ctx.temp
        .child("deps-lock.yaml")
        .write_str(&format!(
            "dependencies:\n  example_txt:\n    docs/example-1.0.0.txt: sha256:{}\n",
            HELLO_SHA256
        ))
        .unwrap();
    ctx.temp.child("local/untracked.txt").write_str("x").unwrap();

    ctx.nexus(&server)
        .args(["deps", "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified 1 file(s)"));

    ctx.temp
        .child("local/docs/example-1.0.0.txt")
        .assert("hello\n");
    ctx.temp
        .child("local/untracked.txt")
        .assert(predicate::path::missing());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deps_sync_detects_tampered_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![asset_json(
            &server,
            "docs/example-1.0.0.txt",
            json!({"sha256": HELLO_SHA256}),
            8,
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/example-1.0.0.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("changed\n"))
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("deps.ini").write_str(MANIFEST).unwrap();
    ctx.temp
        .child("deps-lock.yaml")
        .write_str(&format!(
            "dependencies:\n  example_txt:\n    docs/example-1.0.0.txt: sha256:{}\n",
            HELLO_SHA256
        ))
        .unwrap();

    ctx.nexus(&server)
        .args(["deps", "sync", "--no-cleanup"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("checksum mismatch"));
}
