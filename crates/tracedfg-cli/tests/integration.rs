//! Integration tests for tracedfg-cli.
//!
//! Tests cover the CLI binary invocation: type listings, running graphs from
//! pipeline files, conversion and validation.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to get the path to the `tracedfg` binary built by cargo.
fn tracedfg_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tracedfg"))
}

fn run(args: &[&str]) -> Output {
    tracedfg_bin()
        .args(args)
        .output()
        .expect("failed to run tracedfg")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const PI_TWICE: &str = r#"
name = "pi twice"

[[nodes]]
id = 1
type = "am::core::double_constant"
[nodes.properties]
value = 3.5
num_samples = 2

[[nodes]]
id = 2
type = "am::core::arithmetic::double::add"

[[connections]]
from = "1.out"
to = "2.in"
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[test]
fn cli_types_lists_builtin_types() {
    let output = run(&["types"]);
    assert!(output.status.success(), "tracedfg types failed");

    let stdout = stdout(&output);
    assert!(stdout.contains("Sample Types"));
    for name in [
        "am::core::any",
        "am::core::uint64",
        "am::core::double",
        "am::core::string",
        "am::core::timestamp",
    ] {
        assert!(stdout.contains(name), "types listing should contain '{name}'");
    }
}

#[test]
fn cli_nodes_filter() {
    let output = run(&["nodes", "--filter", "logic"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    assert!(stdout.contains("am::core::logic::and::folding"));
    assert!(stdout.contains("am::core::logic::or::pairwise"));
    assert!(!stdout.contains("am::core::select_nth"));
}

#[test]
fn cli_nodes_detail_shows_ports_and_properties() {
    let output = run(&["nodes", "am::core::select_nth"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    assert!(stdout.contains("Ports"));
    assert!(stdout.contains("am::core::any"));
    assert!(stdout.contains("Properties"));
    assert!(stdout.contains("fail_if_no_input"));
}

#[test]
fn cli_nodes_unknown_type_fails() {
    let output = run(&["nodes", "am::core::nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown node type"));
}

// ---------------------------------------------------------------------------
// Running graphs
// ---------------------------------------------------------------------------

#[test]
fn cli_run_prints_outputs() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pi.toml", PI_TWICE);

    let output = run(&["run", arg(&path)]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = stdout(&output);
    assert!(stdout.contains("node 2 (am::core::arithmetic::double::add)"));
    assert!(stdout.contains("out [am::core::double]: 7"));
    assert!(stdout.contains("Execution order: 1 -> 2"));
}

#[test]
fn cli_run_json_with_override() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pi.toml", PI_TWICE);

    let output = run(&[
        "run",
        arg(&path),
        "--json",
        "--passes",
        "3",
        "--set",
        "1.num_samples=4",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["passes"], 3);
    assert_eq!(json["executed"], serde_json::json!([1, 2]));
    let constant = &json["nodes"][0]["outputs"]["out"];
    assert_eq!(constant["type"], "am::core::double");
    assert_eq!(constant["samples"].as_array().unwrap().len(), 4);
}

#[test]
fn cli_run_sets_numeric_text_on_string_property() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "join.toml",
        r#"
[[nodes]]
id = 1
type = "am::core::uint8_constant"
[nodes.properties]
value = 7
num_samples = 2

[[nodes]]
id = 2
type = "am::core::uint8::to_string"

[[nodes]]
id = 3
type = "am::core::string_concat"

[[connections]]
from = "1.out"
to = "2.in"

[[connections]]
from = "2.out"
to = "3.in"
"#,
    );

    let output = run(&["run", arg(&path), "--set", "3.separator=0"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("out [am::core::string]: 707"));
}

#[test]
fn cli_run_reports_failed_pass() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "overflow.toml",
        r#"
[[nodes]]
id = 1
type = "am::core::uint8_constant"
[nodes.properties]
value = 200
num_samples = 2

[[nodes]]
id = 2
type = "am::core::arithmetic::uint8::add"

[[connections]]
from = "1.out"
to = "2.in"
"#,
    );

    let output = run(&["run", arg(&path)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schedule pass 1 failed"), "{stderr}");
}

// ---------------------------------------------------------------------------
// Conversion and validation
// ---------------------------------------------------------------------------

#[test]
fn cli_convert_roundtrip() {
    let dir = TempDir::new().unwrap();
    let toml = write(&dir, "pi.toml", PI_TWICE);
    let dfg = dir.path().join("out/pi.dfg");
    let back = dir.path().join("back.toml");

    let output = run(&["convert", arg(&toml), arg(&dfg)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("(2 nodes)"));
    assert!(
        std::fs::read_to_string(&dfg)
            .unwrap()
            .contains("am_dfg_graph")
    );

    let output = run(&["convert", arg(&dfg), arg(&back)]);
    assert!(output.status.success());

    let output = run(&["run", arg(&back)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("out [am::core::double]: 7"));

    // Refuses to overwrite without --force.
    let output = run(&["convert", arg(&toml), arg(&dfg)]);
    assert!(!output.status.success());
    let output = run(&["convert", arg(&toml), arg(&dfg), "--force"]);
    assert!(output.status.success());
}

#[test]
fn cli_check_accepts_valid_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pi.toml", PI_TWICE);

    let output = run(&["check", arg(&path)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("ok (2 nodes, 1 connections)"));
}

#[test]
fn cli_check_reports_unknown_property() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "bad.toml",
        r#"
[[nodes]]
id = 1
type = "am::core::double_constant"
[nodes.properties]
volume = 1
"#,
    );

    let output = run(&["check", arg(&path)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown property 'volume'"), "{stderr}");
}

#[test]
fn cli_check_reports_unconnected_mandatory_port() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "dangling.toml",
        r#"
[[nodes]]
id = 1
type = "am::core::string_concat"
"#,
    );

    let output = run(&["check", arg(&path)]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("mandatory port \"in\" is unconnected"));
}
