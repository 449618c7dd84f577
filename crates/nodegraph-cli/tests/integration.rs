//! Integration tests for nodegraph-cli.
//!
//! Tests run the `nodegraph` binary against graph files written into a
//! temporary directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Helper to get the path to the `nodegraph` binary built by cargo.
fn nodegraph_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nodegraph"))
}

fn run(args: &[&str]) -> Output {
    nodegraph_bin()
        .args(args)
        .output()
        .expect("failed to run nodegraph")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

/// `instance0000 = constant(3)`, `instance0001 = add(instance0000, 4)`.
const SUM_GRAPH: &str = r#"{
    "instances": {
        "instance0000": {
            "type": "constant",
            "editor": { "displayName": "three", "x": 0, "y": 0 },
            "initialValues": { "value": 3.0 }
        },
        "instance0001": { "type": "add", "initialValues": { "b": 4.0 } }
    },
    "connections": [
        {
            "from": { "node": "instance0000", "socket": "out" },
            "to": { "node": "instance0001", "socket": "a" }
        }
    ]
}"#;

/// Two adds feeding each other.
const CYCLE_GRAPH: &str = r#"{
    "instances": {
        "instance0000": { "type": "add" },
        "instance0001": { "type": "add" }
    },
    "connections": [
        {
            "from": { "node": "instance0000", "socket": "out" },
            "to": { "node": "instance0001", "socket": "a" }
        },
        {
            "from": { "node": "instance0001", "socket": "out" },
            "to": { "node": "instance0000", "socket": "a" }
        }
    ]
}"#;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// `nodegraph nodes`
// ---------------------------------------------------------------------------

#[test]
fn cli_nodes_lists_catalog() {
    let output = run(&["nodes"]);
    assert!(output.status.success(), "nodegraph nodes failed");

    let stdout = stdout(&output);
    assert!(stdout.contains("Available Nodes"));
    for id in [
        "constant",
        "add",
        "subtract",
        "multiply",
        "divide",
        "counter",
        "accumulator",
    ] {
        assert!(stdout.contains(id), "listing should contain '{id}'");
    }
}

#[test]
fn cli_nodes_detail_shows_sockets() {
    let output = run(&["nodes", "counter"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    assert!(stdout.contains("Counter (counter)"));
    assert!(stdout.contains("step"));
    assert!(stdout.contains("f64"));
    assert!(stdout.contains("not cached"));
}

#[test]
fn cli_nodes_unknown_fails() {
    let output = run(&["nodes", "teleport"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown node: teleport"));
}

// ---------------------------------------------------------------------------
// `nodegraph eval`
// ---------------------------------------------------------------------------

#[test]
fn cli_eval_prints_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(&dir, "sum.json", SUM_GRAPH);

    let output = run(&["eval", path_str(&graph), "--node", "instance0001"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "out = 7.0");
}

#[test]
fn cli_eval_times_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(
        &dir,
        "acc.json",
        r#"{ "instances": { "acc": { "type": "accumulator", "initialValues": { "value": 2 } } } }"#,
    );

    let output = run(&["eval", path_str(&graph), "--node", "acc", "--times", "3"]);
    assert!(output.status.success());
    let lines: Vec<String> = stdout(&output).lines().map(str::to_owned).collect();
    assert_eq!(lines, ["[1] total = 2.0", "[2] total = 4.0", "[3] total = 6.0"]);
}

#[test]
fn cli_eval_unknown_instance_fails() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(&dir, "sum.json", SUM_GRAPH);

    let output = run(&["eval", path_str(&graph), "--node", "instance0009"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown instance: instance0009"));
}

#[test]
fn cli_eval_cycle_fails_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(&dir, "cycle.json", CYCLE_GRAPH);

    let output = run(&["eval", path_str(&graph), "--node", "instance0000"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle"));
}

#[test]
fn cli_eval_depth_limit_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(&dir, "sum.json", SUM_GRAPH);
    let config = write_file(&dir, "nodegraph.toml", "[evaluation]\nmax_depth = 0\n");

    let output = run(&[
        "eval",
        path_str(&graph),
        "--node",
        "instance0001",
        "--config",
        path_str(&config),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("depth"));
}

#[test]
fn cli_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(&dir, "bad.toml", "[evaluation]\ncycle_policy = \"ignore\"\n");

    let output = run(&["nodes", "--config", path_str(&config)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to parse TOML"));
}

#[test]
fn cli_invalid_document_reports_all_errors() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(
        &dir,
        "broken.json",
        r#"{
            "instances": { "a": { "type": "teleport" }, "b": { "type": "add" } },
            "connections": [
                { "from": { "node": "zzz", "socket": "out" }, "to": { "node": "b", "socket": "a" } }
            ]
        }"#,
    );

    let output = run(&["info", path_str(&graph)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown node type 'teleport'"));
    assert!(stderr.contains("no instance with id 'zzz'"));
}

// ---------------------------------------------------------------------------
// `nodegraph info` / `nodegraph convert`
// ---------------------------------------------------------------------------

#[test]
fn cli_info_lists_instances_and_connections() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_file(&dir, "sum.json", SUM_GRAPH);

    let output = run(&["info", path_str(&graph)]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Instances:   2"));
    assert!(stdout.contains("instance0000: constant \"three\" at (0, 0)"));
    assert!(stdout.contains("  value = 3.0"));
    assert!(stdout.contains("instance0000.out -> instance0001.a"));
}

#[test]
fn cli_convert_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let json = write_file(&dir, "sum.json", SUM_GRAPH);
    let binary = dir.path().join("sum.ngb");
    let back = dir.path().join("back.json");

    let output = run(&["convert", path_str(&json), path_str(&binary)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("2 instances, 1 connections"));
    let bytes = std::fs::read(&binary).unwrap();
    assert_eq!(bytes[..4], 1i32.to_be_bytes());

    let output = run(&["eval", path_str(&binary), "--node", "instance0001"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "out = 7.0");

    let output = run(&["convert", path_str(&binary), path_str(&back)]);
    assert!(output.status.success());
    let original: serde_json::Value = serde_json::from_str(SUM_GRAPH).unwrap();
    let restored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&back).unwrap()).unwrap();
    assert_eq!(restored["instances"]["instance0001"], original["instances"]["instance0001"]);
    assert_eq!(restored["connections"], original["connections"]);
}
