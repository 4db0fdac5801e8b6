use serial_test::serial;
use std::process::Command;

/// The binary exits non-zero when the feed yields no roster
#[test]
#[serial]
fn test_application_exits_when_feed_is_unreachable() {
    let cache = tempfile::tempdir().expect("Failed to create cache dir");

    let output = Command::new(env!("CARGO_BIN_EXE_true-rating-processor"))
        .args(["--feed-root", "http://127.0.0.1:9", "--year", "2021"])
        .arg("--cache-dir")
        .arg(cache.path())
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute processor");

    assert!(!output.status.success(), "Process should fail without a roster");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stderr.contains("no players") || stdout.contains("no players"),
        "Expected a roster error, got stdout: {} stderr: {}",
        stdout,
        stderr
    );
}

#[test]
#[serial]
fn test_application_rejects_invalid_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("engine.json");
    std::fs::write(&config, "{ not json").expect("Failed to write config");

    let output = Command::new(env!("CARGO_BIN_EXE_true-rating-processor"))
        .args(["--feed-root", "http://127.0.0.1:9"])
        .arg("--config")
        .arg(&config)
        .arg("--cache-dir")
        .arg(dir.path())
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute processor");

    assert_eq!(output.status.code(), Some(1));
}
