//! Integration tests for the `gl` CLI.
//!
//! Each test creates a temp directory, runs `gl` as a subprocess,
//! and verifies stdout and/or the stored list.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;

/// Get the path to the built `gl` binary.
fn gl_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("gl");
    path
}

/// Run `gl` with the given args in the given directory, returning (stdout, stderr, success).
fn run_gl(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(gl_bin())
        .args(args)
        .current_dir(dir)
        .env("GL_LOG", "warn")
        .output()
        .expect("failed to run gl");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `gl` expecting success, return stdout.
fn run_gl_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_gl(dir, args);
    if !success {
        panic!(
            "gl {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// A list with two categories:
///   [1] Uncategorized: apples(1) kale(2) leeks(3)
///   [2] Dairy: milk(4)
fn create_test_list(root: &Path) {
    run_gl_ok(root, &["init"]);
    run_gl_ok(root, &["add-category", "Dairy"]);
    for item in ["apples", "kale", "leeks"] {
        run_gl_ok(root, &["add", item]);
    }
    run_gl_ok(root, &["add", "milk", "--category", "2", "--quantity", "2l"]);
}

fn listing(root: &Path) -> String {
    run_gl_ok(root, &["list"])
}

// ---------------------------------------------------------------------------
// Setup commands
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_gl_ok(tmp.path(), &["init"]);
    assert!(out.contains("initialized"));
    assert!(tmp.path().join("grocery/list.json").is_file());
    assert!(tmp.path().join("grocery/config.toml").is_file());
    assert_eq!(listing(tmp.path()), "[1] Uncategorized\n  (empty)\n");
}

#[test]
fn test_init_twice_needs_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_gl_ok(tmp.path(), &["init"]);
    let (_, stderr, success) = run_gl(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("--force"));
    run_gl_ok(tmp.path(), &["init", "--force"]);
}

#[test]
fn test_add_prints_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_gl_ok(tmp.path(), &["init"]);
    assert_eq!(run_gl_ok(tmp.path(), &["add-category", "Bakery"]), "2\n");
    assert_eq!(run_gl_ok(tmp.path(), &["add", "bread", "--category", "2"]), "1\n");
}

#[test]
fn test_add_to_missing_category_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_gl_ok(tmp.path(), &["init"]);
    let (_, stderr, success) = run_gl(tmp.path(), &["add", "bread", "--category", "9"]);
    assert!(!success);
    assert!(stderr.contains("category not found: 9"));
}

#[test]
fn test_outside_a_list_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_gl(tmp.path(), &["list"]);
    assert!(!success);
    assert!(stderr.contains("not a grocery list"));
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn test_list_text() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    assert_eq!(
        listing(tmp.path()),
        "\
[1] Uncategorized
  1 apples
  2 kale
  3 leeks

[2] Dairy
  4 milk (2l)
"
    );
}

#[test]
fn test_list_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let out = run_gl_ok(tmp.path(), &["list", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json[0]["name"], "Uncategorized");
    assert_eq!(json[0]["is_default_category"], true);
    assert_eq!(json[0]["entries"][2]["description"], "leeks");
    assert_eq!(json[1]["entries"][0]["quantity"], "2l");
}

#[test]
fn test_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_str().unwrap();
    let out = run_gl_ok(elsewhere.path(), &["-C", dir, "list"]);
    assert!(out.contains("milk"));
}

#[test]
fn test_discovers_from_subdirectory() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let nested = tmp.path().join("recipes/soup");
    fs::create_dir_all(&nested).unwrap();
    assert!(run_gl_ok(&nested, &["list"]).contains("leeks"));
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[test]
fn test_mv_onto_entry_same_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let out = run_gl_ok(tmp.path(), &["mv", "1", "--onto", "3"]);
    assert_eq!(out, "moved entry 1 to position 2\n");
    assert!(listing(tmp.path()).starts_with("[1] Uncategorized\n  2 kale\n  3 leeks\n  1 apples\n"));
}

#[test]
fn test_mv_onto_entry_other_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let out = run_gl_ok(tmp.path(), &["mv", "2", "--onto", "4", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["kind"], "entry");
    assert_eq!(json["new_position"], 0);
    assert_eq!(json["new_category_id"], 2);
    assert!(listing(tmp.path()).ends_with("[2] Dairy\n  2 kale\n  4 milk (2l)\n"));
}

#[test]
fn test_mv_into_category_appends() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    run_gl_ok(tmp.path(), &["mv", "1", "--into", "2"]);
    let list = listing(tmp.path());
    assert!(list.starts_with("[1] Uncategorized\n  2 kale\n  3 leeks\n"));
    assert!(list.ends_with("[2] Dairy\n  4 milk (2l)\n  1 apples\n"));
}

#[test]
fn test_mv_onto_itself_is_noop() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let before = fs::read_to_string(tmp.path().join("grocery/list.json")).unwrap();
    assert_eq!(run_gl_ok(tmp.path(), &["mv", "2", "--onto", "2"]), "no change\n");
    let after = fs::read_to_string(tmp.path().join("grocery/list.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_mv_requires_target() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let (_, _, success) = run_gl(tmp.path(), &["mv", "1"]);
    assert!(!success);
}

#[test]
fn test_mv_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let out = run_gl_ok(tmp.path(), &["mv-category", "2", "--onto", "1"]);
    assert_eq!(out, "moved category 2 to position 0\n");
    assert!(listing(tmp.path()).starts_with("[2] Dairy\n"));
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Layout of the test list as a 20-column screen:
///   row 0 Uncategorized, rows 1-3 apples/kale/leeks, row 4 Dairy, row 5 milk
fn droppables() -> serde_json::Value {
    let rect = |y: f64, h: f64| serde_json::json!({"x": 0.0, "y": y, "width": 20.0, "height": h});
    serde_json::json!([
        {"id": "category-1", "rect": rect(0.0, 4.0)},
        {"id": "entry-1", "rect": rect(1.0, 1.0)},
        {"id": "entry-2", "rect": rect(2.0, 1.0)},
        {"id": "entry-3", "rect": rect(3.0, 1.0)},
        {"id": "category-2", "rect": rect(4.0, 2.0)},
        {"id": "entry-4", "rect": rect(5.0, 1.0)}
    ])
}

fn at(y: f64) -> serde_json::Value {
    serde_json::json!({"pointer": {"x": 2.0, "y": y}, "droppables": droppables()})
}

#[test]
fn test_replay_cross_category_drag() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let script = serde_json::json!([
        {"start": "entry-1"},
        {"over": at(5.2)},
        {"over": at(5.2)},
        {"end": at(5.2)}
    ]);
    let path = tmp.path().join("drag.json");
    fs::write(&path, script.to_string()).unwrap();

    let out = run_gl_ok(tmp.path(), &["replay", path.to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["persisted"], 1);
    assert_eq!(json["outcomes"][0]["outcome"], "committed");
    assert_eq!(json["outcomes"][0]["update"]["new_position"], 0);
    assert_eq!(json["outcomes"][0]["update"]["new_category_id"], 2);
    assert!(listing(tmp.path()).ends_with("[2] Dairy\n  1 apples\n  4 milk (2l)\n"));
}

#[test]
fn test_replay_cancel_persists_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let before = fs::read_to_string(tmp.path().join("grocery/list.json")).unwrap();
    let script = serde_json::json!([
        {"start": "entry-3"},
        {"over": at(5.5)},
        "cancel"
    ]);
    let path = tmp.path().join("drag.json");
    fs::write(&path, script.to_string()).unwrap();

    let out = run_gl_ok(tmp.path(), &["replay", path.to_str().unwrap()]);
    assert_eq!(out, "cancelled\n");
    let after = fs::read_to_string(tmp.path().join("grocery/list.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_replay_out_of_order_event_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_list(tmp.path());
    let path = tmp.path().join("drag.json");
    fs::write(&path, serde_json::json!([{"end": at(1.5)}]).to_string()).unwrap();
    let (_, stderr, success) = run_gl(tmp.path(), &["replay", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("event 0: no drag in progress"));
}
