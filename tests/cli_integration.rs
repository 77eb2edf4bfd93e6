//! Integration tests for the kastle CLI
//!
//! These tests exercise the full CLI workflow using a temporary database.
//! They verify that commands work end-to-end without mocking.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run kastle CLI with a specific database path
fn run_kastle(args: &[&str], db_path: &PathBuf) -> std::process::Output {
    let cwd = db_path.parent().unwrap_or(Path::new("."));
    Command::new(env!("CARGO_BIN_EXE_kastle"))
        .args(args)
        .current_dir(cwd)
        .env("KASTLE_DB_PATH", db_path)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute kastle")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Run a command that must succeed and return its stdout
fn ok(args: &[&str], db_path: &PathBuf) -> String {
    let output = run_kastle(args, db_path);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        stderr(&output)
    );
    stdout(&output)
}

/// Builds the "Root Configuration" tree: nodes 1 -> 2 in version 1,
/// tagged copy in version 2 (nodes 3, 4), restored copy in version 3 (nodes 5, 6)
fn build_root_configuration(db_path: &PathBuf) {
    ok(&["tree", "create", "Root Configuration", "--tag", "v1.0"], db_path);
    ok(&["node", "add", "Root Configuration", r#"{"setting":"value1"}"#], db_path);
    ok(&["node", "add", "Root Configuration", r#"{"setting":"value2"}"#], db_path);
    ok(
        &["edge", "add", "Root Configuration", "1", "2", "--data", r#"{"type":"dependency"}"#],
        db_path,
    );
    ok(
        &["tag", "Root Configuration", "release-v1.0", "-d", "First stable release"],
        db_path,
    );
    ok(&["restore", "Root Configuration", "release-v1.0"], db_path);
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_kastle"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("kastle"));
    assert!(out.contains("Versioned directed graphs"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_kastle"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("kastle"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_kastle"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef kastle"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_kastle"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(
        stdout(&output).contains("_kastle"),
        "bash completion should contain _kastle function"
    );
}

// =============================================================================
// Tree Tests
// =============================================================================

#[test]
fn test_init_creates_kastle_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_kastle"))
        .arg("init")
        .current_dir(temp_dir.path())
        .env_remove("KASTLE_DB_PATH")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "init failed: {}", stderr(&output));
    assert!(temp_dir.path().join(".kastle/kastle.db").exists());
    assert!(temp_dir.path().join(".kastle/config.toml").exists());
}

#[test]
fn test_create_and_list_trees() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let out = ok(&["tree", "create", "alpha"], &db_path);
    assert!(out.contains("tree 1 'alpha'"));
    ok(&["tree", "create", "beta", "--tag", "v1.0"], &db_path);

    let out = ok(&["tree", "list"], &db_path);
    assert!(out.contains("alpha"));
    assert!(out.contains("beta"));
}

#[test]
fn test_delete_tree() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    ok(&["tree", "create", "doomed"], &db_path);
    ok(&["node", "add", "doomed", r#"{"k":1}"#], &db_path);
    let out = ok(&["tree", "delete", "doomed"], &db_path);
    assert!(out.contains("doomed"));

    let output = run_kastle(&["versions", "doomed"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No tree named 'doomed'"));
}

// =============================================================================
// Versioning Workflow Tests
// =============================================================================

#[test]
fn test_tag_and_restore_workflow() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    let out = ok(&["versions", "Root Configuration"], &db_path);
    assert!(out.contains("3 versions"));
    assert!(out.contains("release-v1.0"));
    assert!(out.contains("Restored version from tag release-v1.0"));

    // Latest (restored) version holds fresh copies 5 -> 6
    let out = ok(&["path", "Root Configuration", "5", "6"], &db_path);
    assert!(out.contains("5 -> 6"));

    // Tagged version keeps its own copies
    let out = ok(&["path", "Root Configuration", "3", "4", "--tag", "release-v1.0"], &db_path);
    assert!(out.contains("3 -> 4"));

    let out = ok(&["show", "Root Configuration", "--json"], &db_path);
    let snapshot: serde_json::Value = serde_json::from_str(&out).expect("show --json is JSON");
    assert_eq!(snapshot["version"]["id"], 3);
    assert_eq!(snapshot["nodes"].as_array().map(|n| n.len()), Some(2));
    assert_eq!(snapshot["nodes"][0]["data"]["setting"], "value1");
    assert_eq!(snapshot["edges"][0]["incoming_node_id"], 5);
    assert_eq!(snapshot["edges"][0]["outgoing_node_id"], 6);
}

#[test]
fn test_branch_from_tag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    ok(&["branch", "Root Configuration", "v1.0"], &db_path);
    let out = ok(&["versions", "Root Configuration"], &db_path);
    assert!(out.contains("New version from tag v1.0"));
    assert!(out.contains("4 versions"));
}

#[test]
fn test_walk_and_children() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    let out = ok(&["walk", "Root Configuration", "5"], &db_path);
    assert!(out.contains("value1"));
    assert!(out.contains("value2"));
    assert!(out.contains("Visited 2 nodes"));

    let out = ok(&["children", "5"], &db_path);
    assert!(out.contains("value2"));
    assert!(!out.contains("value1"));

    let out = ok(&["children", "6", "--parents"], &db_path);
    assert!(out.contains("value1"));
}

#[test]
fn test_show_dot() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    let out = ok(
        &["show", "Root Configuration", "--dot", "--version-id", "1", "--label", "setting"],
        &db_path,
    );
    assert!(out.contains("digraph Version1"));
    assert!(out.contains("[1] value1"));
    assert!(out.contains("1 -> 2 [label=\"dependency\"]"));
}

#[test]
fn test_demo_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let out = ok(&["demo"], &db_path);
    assert!(out.contains("Root Configuration"));
    assert!(out.contains("release-v1.0"));
    assert!(out.contains("value1"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_duplicate_tag_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    let output = run_kastle(&["tag", "Root Configuration", "release-v1.0"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_unknown_tag_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    ok(&["tree", "create", "t"], &db_path);

    let output = run_kastle(&["restore", "t", "missing"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No version with tag 'missing'"));
}

#[test]
fn test_invalid_node_data_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    ok(&["tree", "create", "t"], &db_path);

    let output = run_kastle(&["node", "add", "t", "[1, 2]"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid input"));
}

#[test]
fn test_cross_version_edge_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    // Node 1 lives in version 1, the latest version is 3
    let output = run_kastle(&["edge", "add", "Root Configuration", "1", "5"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("belongs to version 1"));
}

#[test]
fn test_path_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    build_root_configuration(&db_path);

    let out = ok(&["path", "Root Configuration", "6", "5"], &db_path);
    assert!(out.contains("No path from 6 to 5"));

    let output = run_kastle(&["path", "Root Configuration", "1", "5"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Node 1 not found"));
}
