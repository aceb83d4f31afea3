//! Integration tests for the `stackfx` binary entry point.
//!
//! Verifies configuration flags reach the loader and that failures surface on
//! stderr with a non-zero exit status.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn plugin_root() -> TempDir {
    let root = TempDir::new().expect("temp dir");
    let package = root.path().join("blur");
    fs::create_dir_all(&package).expect("create package");
    fs::write(
        package.join("meta.json"),
        r#"{ "name": "Blur", "mlt_service": "boxblur", "unique_id": "blur", "single_instance": true }"#,
    )
    .expect("write descriptor");
    root
}

#[test]
fn list_uses_plugin_root_flag() {
    let root = plugin_root();
    let mut command = cargo_bin_cmd!("stackfx");
    command
        .current_dir(root.path())
        .env_remove("STACKFX_PLUGIN_ROOT")
        .arg("--plugin-root")
        .arg(root.path())
        .arg("list");
    command
        .assert()
        .success()
        .stdout(contains("blur\tBlur\tboxblur [single]"));
}

#[test]
fn plugin_root_is_read_from_environment() {
    let root = plugin_root();
    let mut command = cargo_bin_cmd!("stackfx");
    command
        .current_dir(root.path())
        .env("STACKFX_PLUGIN_ROOT", root.path())
        .args(["attach", "blur", "blur"]);
    command
        .assert()
        .success()
        .stdout(contains("Only one Blur filter is allowed."))
        .stdout(contains("* 0 Blur"));
}

#[test]
fn missing_plugin_root_exits_with_failure() {
    let root = TempDir::new().expect("temp dir");
    let mut command = cargo_bin_cmd!("stackfx");
    command
        .current_dir(root.path())
        .arg("--plugin-root")
        .arg(root.path().join("absent"))
        .arg("list");
    command
        .assert()
        .failure()
        .stderr(contains("cannot read plugin root"));
}

#[test]
fn missing_command_exits_with_failure() {
    let mut command = cargo_bin_cmd!("stackfx");
    command.assert().failure().stderr(contains("Usage"));
}
