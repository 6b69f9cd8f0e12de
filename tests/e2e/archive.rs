use super::*;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Upload `src` as `libs/builds/<archive>`, then download it back into `out`.
async fn compressed_round_trip(archive: &str) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPONENTS_PATH))
        .and(query_param("repository", "libs"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.temp.child("src/a.txt").write_str("alpha").unwrap();
    ctx.temp.child("src/nested/b.txt").write_str("bravo").unwrap();
    let remote = format!("libs/builds/{}", archive);

    ctx.nexus(&server)
        .args(["upload", "--compress"])
        .arg(ctx.path("src"))
        .arg(&remote)
        .assert()
        .success()
        .stdout(predicate::str::contains("Files uploaded: 1"));

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let text = String::from_utf8_lossy(&upload.body);
    assert!(text.contains(&format!("filename=\"{}\"", archive)));
    assert!(text.contains("name=\"raw.directory\"\r\n\r\nbuilds\r\n"));
    let bytes = file_part(upload);

    server.reset().await;
    let asset_path = format!("builds/{}", archive);
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("repository", "libs"))
        .and(query_param("q", "/builds/*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![asset_json(
            &server,
            &asset_path,
            json!({"sha1": "ff"}),
            bytes.len() as u64,
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repository/libs/{}", asset_path)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(&server)
        .await;

    ctx.nexus(&server)
        .args(["download", "--compress"])
        .arg(&remote)
        .arg(ctx.path("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("failed: 0"));

    ctx.temp.child("out/a.txt").assert("alpha");
    ctx.temp.child("out/nested/b.txt").assert("bravo");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compressed_round_trip_gzip() {
    compressed_round_trip("out.tar.gz").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compressed_round_trip_zip() {
    compressed_round_trip("out.zip").await;
}
