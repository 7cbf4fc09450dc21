//! CLI integration tests
//!
//! Drive the built `bindery` binary against settings files in a temp dir.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn setup_test_config(temp_dir: &TempDir) -> PathBuf {
    let main_db = temp_dir.path().join("main.db");
    let reports_db = temp_dir.path().join("reports.db");

    Connection::open(&main_db)
        .unwrap()
        .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")
        .unwrap();
    Connection::open(&reports_db)
        .unwrap()
        .execute_batch(
            "CREATE TABLE report (id INTEGER PRIMARY KEY);
             CREATE TABLE audit (id INTEGER PRIMARY KEY);",
        )
        .unwrap();

    let config_path = temp_dir.path().join("bindery.toml");
    fs::write(
        &config_path,
        format!(
            "BINDERY_DATABASE_URI = \"sqlite:///{}\"\n\n[BINDERY_BINDS]\nreports = \"sqlite:///{}\"\n",
            main_db.display(),
            reports_db.display()
        ),
    )
    .unwrap();
    config_path
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bindery"))
        .env_remove("BINDERY_DATABASE_URI")
        .env_remove("BINDERY_BINDS")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_cli_binds_lists_default_and_named() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_test_config(&temp_dir);

    let output = run(&config, &["binds"]);
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("<default>\tsqlite:///"));
    assert!(lines[1].starts_with("reports\tsqlite:///"));
}

#[test]
fn test_cli_tables_across_binds() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_test_config(&temp_dir);

    let output = run(&config, &["tables"]);
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["<default>\tusers", "reports\taudit", "reports\treport"]
    );
}

#[test]
fn test_cli_tables_single_bind() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_test_config(&temp_dir);

    let output = run(&config, &["tables", "--bind", "reports"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("users"));
    assert!(stdout.contains("reports\treport"));
}

#[test]
fn test_cli_unknown_bind_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_test_config(&temp_dir);

    let output = run(&config, &["tables", "--bind", "nope"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_UNKNOWN_BIND"), "Stderr: {}", stderr);
    assert!(stderr.contains("nope"));
}

#[test]
fn test_cli_ping() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_test_config(&temp_dir);

    let output = run(&config, &["ping"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ <default>"));
    assert!(stdout.contains("✓ reports"));
}

#[test]
fn test_cli_ping_reports_unreachable_bind() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bindery.toml");
    fs::write(
        &config_path,
        format!(
            "BINDERY_DATABASE_URI = \"sqlite://\"\nBINDERY_POOL_TIMEOUT_MS = 500\n\n[BINDERY_BINDS]\nbroken = \"sqlite:///{}\"\n",
            temp_dir.path().join("missing-dir").join("x.db").display()
        ),
    )
    .unwrap();

    let output = run(&config_path, &["ping"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ <default>"));
    assert!(stdout.contains("✗ broken"));
}

#[test]
fn test_cli_missing_uri_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let output = run(&config_path, &["binds"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BINDERY_DATABASE_URI"), "Stderr: {}", stderr);
}
