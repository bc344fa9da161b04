//! Integration tests for the `portal-sections` binary.
//!
//! Each test points the CLI at its own temp store and config home so runs
//! never touch the user's files, then checks stdout and the stored JSON.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_portal-sections");

/// Command with an isolated config home and store dir.
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("PORTAL_LOG")
        .args([
            "--store-dir",
            home.path().join("store").to_str().expect("valid path"),
            "--job",
            "job-1",
            "--profile",
            "ada",
        ]);
    cmd
}

fn stored(home: &TempDir) -> serde_json::Value {
    let path = home.path().join("store/ada/job-1.json");
    let raw = std::fs::read_to_string(&path).expect("stored layout exists");
    serde_json::from_str(&raw).expect("stored layout is JSON")
}

fn stored_types(home: &TempDir) -> Vec<String> {
    stored(home)["sections"]
        .as_array()
        .expect("sections array")
        .iter()
        .map(|s| s["type"].as_str().expect("type").to_string())
        .collect()
}

fn show_json(home: &TempDir) -> serde_json::Value {
    let output = cmd(home)
        .args(["show", "--json"])
        .output()
        .expect("failed to run show");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("show --json prints JSON")
}

#[test]
fn show_without_stored_layout_lists_defaults() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Portal ada/job-1 (clean)"))
        .stdout(predicate::str::contains("header"))
        .stdout(predicate::str::contains("Work Experience"));
    assert!(
        !home.path().join("store").exists(),
        "show must not write anything"
    );
}

#[test]
fn move_saves_new_order() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["move", "0", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));
    let types = stored_types(&home);
    assert_eq!(&types[..3], &["summary", "experience", "header"]);
    assert_eq!(stored(&home)["schema_version"], 1);
}

#[test]
fn move_out_of_range_is_no_change() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["move", "0", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No change"));
}

#[test]
fn hide_header_fails_and_saves_nothing() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["hide", "header"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
    assert!(!home.path().join("store/ada/job-1.json").exists());
}

#[test]
fn hide_then_reveal_by_type() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home).args(["hide", "skills"]).assert().success();
    let doc = show_json(&home);
    let skills = doc["sections"]
        .as_array()
        .expect("sections")
        .iter()
        .find(|s| s["type"] == "skills")
        .expect("skills present")
        .clone();
    assert_eq!(skills["visible"], false);

    cmd(&home).args(["reveal", "skills"]).assert().success();
    let doc = show_json(&home);
    assert!(doc["sections"]
        .as_array()
        .expect("sections")
        .iter()
        .all(|s| s["visible"] == true));
}

#[test]
fn add_duplicate_type_fails() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["add", "skills"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_then_delete_keeps_orders_dense() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["add", "projects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added section_"));
    cmd(&home).args(["delete", "summary"]).assert().success();

    let doc = stored(&home);
    let sections = doc["sections"].as_array().expect("sections");
    let orders: Vec<u64> = sections
        .iter()
        .map(|s| s["order"].as_u64().expect("order"))
        .collect();
    let expected: Vec<u64> = (0..sections.len() as u64).collect();
    assert_eq!(orders, expected);
    assert!(sections.iter().any(|s| s["type"] == "projects"));
    assert!(!sections.iter().any(|s| s["type"] == "summary"));
}

#[test]
fn rename_and_edit_payloads() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["rename", "skills", "Toolbox"])
        .assert()
        .success();
    cmd(&home)
        .args(["edit", "skills", "--data", r#"{"items": ["Rust"]}"#])
        .assert()
        .success();
    cmd(&home)
        .args(["edit", "skills", "--data", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data"));

    cmd(&home)
        .args(["preview", "--width", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Toolbox"))
        .stdout(predicate::str::contains("• Rust"));
}

#[test]
fn layout_change_is_persisted() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .args(["layout", "--spacing", "relaxed", "--duration", "150"])
        .assert()
        .success();
    let doc = stored(&home);
    assert_eq!(doc["layout_config"]["spacing"], "relaxed");
    assert_eq!(doc["layout_config"]["animation"]["duration_ms"], 150);

    cmd(&home)
        .arg("layout")
        .assert()
        .success()
        .stdout(predicate::str::contains("spacing=relaxed"));
}

#[test]
fn reset_restores_defaults() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home).args(["move", "0", "3"]).assert().success();
    cmd(&home).arg("reset").assert().success();
    let types = stored_types(&home);
    assert_eq!(types[0], "header");
}

#[test]
fn types_lists_registry() {
    let home = TempDir::new().expect("temp dir");
    cmd(&home)
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("header"))
        .stdout(predicate::str::contains("required"))
        .stdout(predicate::str::contains("multiple"));
}

#[test]
fn config_init_path_validate() {
    let home = TempDir::new().expect("temp dir");
    let config_path = home.path().join("config/portal-sections/config.toml");

    cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path_str(&config_path)));

    cmd(&home).args(["config", "init"]).assert().success();
    assert!(config_path.exists());
    cmd(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    cmd(&home)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn invalid_config_is_reported_with_position() {
    let home = TempDir::new().expect("temp dir");
    let path = home.path().join("bad.toml");
    std::fs::write(&path, "[layout]\nspacing = \"huge\"\n").expect("write config");
    cmd(&home)
        .args(["--config", path_str(&path), "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.toml:2:"));
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("valid path")
}
