//! Tests for `nexuscli upload` argument handling

use super::common::nexus_command;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    let output = nexus_command(temp.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("upload"));
    assert!(stdout.contains("download"));
    assert!(stdout.contains("deps"));
}

#[test]
fn test_upload_rejects_unknown_checksum() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let output = nexus_command(temp.path())
        .args(["upload", "--checksum", "crc32"])
        .arg(&src)
        .arg("libs/docs")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported checksum algorithm 'crc32'"));
}

#[test]
fn test_upload_compress_requires_archive_name() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.txt"), "a").unwrap();

    let output = nexus_command(temp.path())
        .args(["upload", "--compress"])
        .arg(&src)
        .arg("libs/docs")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("you must specify the .tar.gz filename in the destination path"));
}

#[test]
fn test_upload_key_from_requires_placeholder() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(temp.path().join("Cargo.lock"), "lock").unwrap();

    let output = nexus_command(temp.path())
        .arg("upload")
        .arg("--key-from")
        .arg(temp.path().join("Cargo.lock"))
        .arg(&src)
        .arg("cache/build")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("{key} template placeholder"));
}

#[test]
fn test_upload_missing_source_directory() {
    let temp = TempDir::new().unwrap();

    let output = nexus_command(temp.path())
        .arg("upload")
        .arg(temp.path().join("nope"))
        .arg("libs/docs")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not a directory"));
}
