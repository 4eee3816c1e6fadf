//! End-to-end runs of the `schema-loader` binary in dry-run mode

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn schema_loader(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-loader"))
        .current_dir(dir)
        .env_remove("SCHEMA_LOADER__GRAPH")
        .env_remove("SCHEMA_LOADER_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_dry_run_prints_json_summary() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "defs.script",
        "schema.propertyKey(\"name\").create()\nschema.vertexLabel(\"person\").properties(\"name\").create()\n",
    );
    let output = schema_loader(
        dir.path(),
        &[
            "--dry-run",
            "-g",
            "g1",
            "-s",
            &script,
            "--clear-all-data",
            "--summary-format",
            "json",
            "--quiet",
        ],
    );

    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["graph"], "g1");
    assert_eq!(summary["success"], true);
    assert_eq!(summary["cleared"], true);
    assert_eq!(summary["counts"]["vertex_labels"], 1);
    assert!(summary["started_at"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_failed_run_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "defs.script", "graph.propertyKey(\"name\").create()");
    let output = schema_loader(dir.path(), &["--dry-run", "-s", &script, "--quiet"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed"), "stdout={}", stdout);
    assert!(stdout.contains("No such property: graph"));
}

#[test]
fn test_test_mode_prints_cause_chain() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "defs.script", "graph.propertyKey(\"name\").create()");
    let output = schema_loader(
        dir.path(),
        &["--dry-run", "--test-mode", "-s", &script, "--quiet"],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Failed to load schema"), "stderr={}", stderr);
    assert!(stderr.contains("caused by: Script error at line 1"));
}

#[test]
fn test_print_config_layers_file_env_and_flags() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "schema-loader.toml",
        "graph = \"from-file\"\nhost = \"graph.internal\"\ntimeout = 15\n",
    );
    let output = Command::new(env!("CARGO_BIN_EXE_schema-loader"))
        .current_dir(dir.path())
        .env("SCHEMA_LOADER__GRAPH", "from-env")
        .args(["--print-config", "--timeout", "30"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("graph = \"from-env\""), "stdout={}", stdout);
    assert!(stdout.contains("host = \"graph.internal\""));
    assert!(stdout.contains("timeout = 30"));
}

#[test]
fn test_invalid_configuration_exits_before_run() {
    let dir = TempDir::new().unwrap();
    let output = schema_loader(dir.path(), &["--dry-run", "--port", "0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"), "stderr={}", stderr);
}

#[test]
fn test_missing_config_file_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let output = schema_loader(dir.path(), &["--config", "absent.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}
