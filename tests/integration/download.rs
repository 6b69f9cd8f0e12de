//! Tests for `nexuscli download` argument handling

use super::common::nexus_command;
use tempfile::TempDir;

#[test]
fn test_download_requires_folder_in_source() {
    let temp = TempDir::new().unwrap();

    let output = nexus_command(temp.path())
        .args(["download", "libs"])
        .arg(temp.path().join("out"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must be in the form 'repository/folder'"));
}

#[test]
fn test_download_rejects_unknown_compress_format() {
    let temp = TempDir::new().unwrap();

    let output = nexus_command(temp.path())
        .args(["download", "--compress", "--compress-format", "rar"])
        .arg("libs/docs/a.rar")
        .arg(temp.path().join("out"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported compression format 'rar'"));
}

#[test]
fn test_download_bad_glob() {
    let temp = TempDir::new().unwrap();

    let output = nexus_command(temp.path())
        .args(["download", "--glob", "**/[.txt"])
        .arg("libs/docs")
        .arg(temp.path().join("out"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid glob pattern"));
}
