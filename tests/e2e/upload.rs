use super::*;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_sends_one_component_per_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMPONENTS_PATH))
        .and(query_param("repository", "libs"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("src/a.txt").write_str("alpha").unwrap();
    ctx.temp.child("src/nested/b.txt").write_str("bravo").unwrap();

    ctx.nexus(&server)
        .arg("upload")
        .arg(ctx.path("src"))
        .arg("libs/docs")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files uploaded: 2"));

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<String> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert!(bodies.iter().all(|b| b.contains("name=\"raw.directory\"")));
    assert!(bodies.iter().any(|b| b.contains("nested/b.txt") && b.contains("bravo")));
    assert!(bodies.iter().any(|b| b.contains("a.txt") && b.contains("alpha")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_to_missing_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMPONENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("src/a.txt").write_str("alpha").unwrap();

    ctx.nexus(&server)
        .arg("upload")
        .arg(ctx.path("src"))
        .arg("nope/docs")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("repository 'nope' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_dry_run_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("src/a.txt").write_str("alpha").unwrap();

    ctx.nexus(&server)
        .args(["upload", "--dry-run"])
        .arg(ctx.path("src"))
        .arg("libs/docs")
        .assert()
        .success();
}
