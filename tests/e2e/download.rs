use super::*;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn serve_docs_folder(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("repository", "libs"))
        .and(query_param("q", "/docs/*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            asset_json(server, "docs/a.txt", json!({"sha1": "aa"}), 5),
            asset_json(server, "docs/sub/b.txt", json!({"sha1": "bb"}), 7),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alpha"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/sub/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("bravo!!"))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_flatten() {
    let server = MockServer::start().await;
    serve_docs_folder(&server).await;
    let ctx = TestContext::new();

    ctx.nexus(&server)
        .args(["download", "--flatten", "libs/docs"])
        .arg(ctx.path("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Files downloaded: 2, skipped: 0, deleted: 0, failed: 0",
        ));

    ctx.temp.child("out/a.txt").assert("alpha");
    ctx.temp.child("out/sub/b.txt").assert("bravo!!");
    ctx.temp.child("out/docs").assert(predicate::path::missing());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_keeps_repository_layout() {
    let server = MockServer::start().await;
    serve_docs_folder(&server).await;
    let ctx = TestContext::new();

    ctx.nexus(&server)
        .args(["download", "-q", "libs/docs"])
        .arg(ctx.path("out"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    ctx.temp.child("out/docs/a.txt").assert("alpha");
    ctx.temp.child("out/docs/sub/b.txt").assert("bravo!!");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_delete_removes_extra_files() {
    let server = MockServer::start().await;
    serve_docs_folder(&server).await;
    let ctx = TestContext::new();
    ctx.temp.child("out/stale.txt").write_str("old").unwrap();
    ctx.temp.child("out/docs/old/gone.txt").write_str("old").unwrap();

    ctx.nexus(&server)
        .args(["download", "--delete", "libs/docs"])
        .arg(ctx.path("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted: 2"));

    ctx.temp.child("out/stale.txt").assert(predicate::path::missing());
    ctx.temp.child("out/docs/old").assert(predicate::path::missing());
    ctx.temp.child("out/docs/a.txt").assert("alpha");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_empty_folder_exits_66() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;
    let ctx = TestContext::new();

    ctx.nexus(&server)
        .args(["download", "libs/missing"])
        .arg(ctx.path("out"))
        .assert()
        .code(66)
        .stderr(predicate::str::contains(
            "No assets found in folder 'missing' in repository 'libs'",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_failure_sets_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            asset_json(&server, "docs/a.txt", json!({"sha1": "aa"}), 5),
            asset_json(&server, "docs/broken.txt", json!({"sha1": "cc"}), 5),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alpha"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repository/libs/docs/broken.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let ctx = TestContext::new();

    ctx.nexus(&server)
        .args(["download", "libs/docs"])
        .arg(ctx.path("out"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed: 1"));

    ctx.temp.child("out/docs/a.txt").assert("alpha");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_into_current_directory() {
    let server = MockServer::start().await;
    serve_docs_folder(&server).await;
    let ctx = TestContext::new();
    ctx.temp.child("out").create_dir_all().unwrap();

    ctx.nexus(&server)
        .current_dir(ctx.path("out"))
        .args(["download", "libs/docs", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Files downloaded: 2, skipped: 0, deleted: 0, failed: 0",
        ));

    ctx.temp.child("out/docs/a.txt").assert("alpha");
    ctx.temp.child("out/docs/sub/b.txt").assert("bravo!!");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_delete_in_current_directory() {
    let server = MockServer::start().await;
    serve_docs_folder(&server).await;
    let ctx = TestContext::new();
    ctx.temp.child("out/stale.txt").write_str("old").unwrap();

    ctx.nexus(&server)
        .current_dir(ctx.path("out"))
        .args(["download", "--delete", "libs/docs", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted: 1"));

    ctx.temp.child("out/stale.txt").assert(predicate::path::missing());
    ctx.temp.child("out/docs/a.txt").assert("alpha");
}
