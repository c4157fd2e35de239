mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

use common::{record, MockCorpus, TOKEN};

fn helpsearch_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_helpsearch"))
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/helpsearch.sqlite"

[source]
base_url = "{}"
timeout_secs = 5

[index]
chunk_size = 2

[server]
bind = "127.0.0.1:0"
update_token = "{}"
"#,
        root.display(),
        base_url,
        TOKEN
    );

    let config_path = config_dir.join("helpsearch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_helpsearch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = helpsearch_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run helpsearch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run the CLI off the async runtime so the mock corpus keeps serving.
async fn run_helpsearch_async(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let config_path = config_path.to_path_buf();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_helpsearch(&config_path, &args)
    })
    .await
    .unwrap()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    let (stdout, stderr, success) = run_helpsearch(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/helpsearch.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    let (_, _, success1) = run_helpsearch(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_helpsearch(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_search_empty_index() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    run_helpsearch(&config_path, &["init"]);
    let (stdout, _, success) = run_helpsearch(&config_path, &["search", "anything"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_stats_empty_index() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    run_helpsearch(&config_path, &["init"]);
    let (stdout, _, success) = run_helpsearch(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Entries:     0"));
}

#[test]
fn test_clear_empty_index() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    run_helpsearch(&config_path, &["init"]);
    let (stdout, _, success) = run_helpsearch(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("deleted 0 entries"));
}

#[test]
fn test_update_empty_range_needs_no_source() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    run_helpsearch(&config_path, &["init"]);
    let (stdout, stderr, success) =
        run_helpsearch(&config_path, &["update", "--start", "5", "--finish", "5"]);
    assert!(success, "update failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("loaded: 0"));
    assert!(stderr.contains("leaving index unchanged"));
}

#[test]
fn test_update_unreachable_source_fails() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/search");

    run_helpsearch(&config_path, &["init"]);
    let (_, stderr, success) =
        run_helpsearch(&config_path, &["update", "--start", "1", "--finish", "3"]);
    assert!(!success);
    assert!(stderr.contains("error updating index"));
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_helpsearch(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_errors() {
    let (_tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_helpsearch(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("base_url"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_then_search_and_stats() {
    let corpus = MockCorpus::new();
    corpus.set_page(
        1,
        json!([
            record("/man/ls", "ls", "list directory contents"),
            record("/man/cp", "cp", "copy files and directories"),
            record("/man/mv", "mv", "move or rename files"),
        ]),
    );
    corpus.set_page(2, json!([record("/man/ls", "ls again", "duplicate")]));
    let base_url = corpus.start().await;
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_helpsearch_async(&config_path, &["init"]).await;
    let (stdout, stderr, success) = run_helpsearch_async(&config_path, &["update"]).await;
    assert!(success, "update failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("pages: 2"));
    assert!(stdout.contains("loaded: 3"));
    assert!(stdout.contains("repeated: 1"));
    assert!(stdout.contains("entries: 0 -> 3"));
    assert!(stderr.contains("processing "));

    let (stdout, _, success) = run_helpsearch_async(&config_path, &["search", "files"]).await;
    assert!(success);
    assert!(stdout.contains("/man/cp"));
    assert!(stdout.contains("/man/mv"));
    assert!(!stdout.contains("/man/ls"));

    let (stdout1, _, _) = run_helpsearch_async(&config_path, &["search", "files"]).await;
    assert_eq!(stdout, stdout1);

    let (stdout, _, success) = run_helpsearch_async(&config_path, &["stats"]).await;
    assert!(success);
    assert!(stdout.contains("Entries:     3"));
    assert!(stdout.contains("man"));
}
