mod common;

use std::io::Write;

use common::run_command;

#[test]
fn version_json_output() {
    let output = run_command(&["version", "--format", "json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(parsed["name"], "gridclash");
}

#[test]
fn completions_bash() {
    let output = run_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("gridclash"));
}

#[test]
fn missing_config_file_exits_with_config_error() {
    let output = run_command(&[
        "serve",
        "--config",
        "/tmp/nonexistent_gridclash_test_file.yaml",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_config_exits_with_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "board:\n  size: 1\n  spawn_ratio: 2.0").unwrap();

    let output = run_command(&["serve", "--config", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("board.size"), "stderr: {stderr}");
    assert!(stderr.contains("board.spawn_ratio"), "stderr: {stderr}");
}

#[test]
fn invalid_bind_exits_with_transport_error() {
    let output = run_command(&["serve", "--bind", "not-an-address"]);
    assert_eq!(output.status.code(), Some(4));
}
