//! Tests for `nexuscli deps` subcommands that stay offline

use super::common::nexus_command;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_deps_init_then_env() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    let output = nexus_command(temp.path())
        .args(["deps", "init"])
        .current_dir(&project)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(project.join("deps.ini").exists());

    let output = nexus_command(temp.path())
        .args(["deps", "env"])
        .current_dir(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let env = fs::read_to_string(project.join("deps.env")).unwrap();
    assert!(env.contains("DEPS_DOCS_FOLDER_VERSION=\"2025-10-15\""));
    assert!(env.contains("DEPS_EXAMPLE_TXT_NAME=\"example_txt\""));
    assert!(env.contains("DEPS_LIBFOO_TAR_VERSION=\"1.2.3\""));
}

#[test]
fn test_deps_init_refuses_overwrite() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("deps.ini"), "[defaults]\n").unwrap();

    let output = nexus_command(temp.path())
        .args(["deps", "init"])
        .current_dir(temp.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(
        fs::read_to_string(temp.path().join("deps.ini")).unwrap(),
        "[defaults]\n"
    );
}

#[test]
fn test_deps_lock_reports_misspelled_key() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("deps.ini"),
        "[defaults]\nrepository = libs\n\n[example_txt]\npath = docs/a.txt\nrepositry = libs\n",
    )
    .unwrap();

    let output = nexus_command(temp.path())
        .args(["deps", "lock"])
        .current_dir(temp.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("repositry"));
    assert!(stderr.contains("example_txt"));
}

#[test]
fn test_deps_sync_without_lock_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("deps.ini"),
        "[defaults]\nrepository = libs\n\n[example_txt]\npath = docs/a.txt\n",
    )
    .unwrap();

    let output = nexus_command(temp.path())
        .args(["deps", "sync"])
        .current_dir(temp.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("deps-lock.yaml"));
}

#[test]
fn test_deps_env_without_manifest() {
    let temp = TempDir::new().unwrap();

    let output = nexus_command(temp.path())
        .args(["deps", "env"])
        .current_dir(temp.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!temp.path().join("deps.env").exists());
}
