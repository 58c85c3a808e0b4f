//! Tests for the `autodata` binary.
//!
//! Each test runs the compiled CLI in a scratch directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_dry_run(dir: &Path) -> Output {
    fs::write(dir.join("people.csv"), "name,age\nAnn,30\nBob,41\n").unwrap();
    Command::new(env!("CARGO_BIN_EXE_autodata"))
        .current_dir(dir)
        .args(["--input", "people.csv", "--dry-run"])
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY")
        .output()
        .expect("Failed to run autodata")
}

#[test]
fn test_dry_run_logs_at_info_by_default() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_dry_run(dir.path());
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loading dataset"), "stderr: {}", stderr);
}

#[test]
fn test_env_file_configures_logging() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "RUST_LOG=warn\n").unwrap();

    let output = run_dry_run(dir.path());
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Loading dataset"), "stderr: {}", stderr);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("age"), "stdout: {}", stdout);
}
