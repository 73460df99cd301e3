//! End-to-end runs of the `ctegraph` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::NamedTempFile;

const SCENARIO: &str = "WITH b AS (SELECT * FROM a), c AS (SELECT * FROM b) SELECT * FROM c";

fn sql_file(sql: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{sql}").expect("write sql");
    file
}

fn ctegraph(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ctegraph"))
        .args(args)
        .output()
        .expect("run ctegraph")
}

fn ctegraph_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ctegraph"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn ctegraph");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for ctegraph")
}

fn node_ids(json: &Value) -> Vec<&str> {
    json["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .map(|node| node["id"].as_str().expect("node id"))
        .collect()
}

#[test]
fn json_output_lists_nodes_in_discovery_order() {
    let file = sql_file(SCENARIO);
    let output = ctegraph(&["-f", "json", file.path().to_str().unwrap()]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(node_ids(&json), vec!["b", "a", "c", "(main)"]);
    assert_eq!(json["edges"][0]["id"], "a->b");
}

#[test]
fn reads_stdin_when_no_file_given() {
    let output = ctegraph_stdin(&["-f", "json", "-c"], "SELECT * FROM orders");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(node_ids(&json), vec!["(main)", "orders"]);
}

#[test]
fn mermaid_output_is_a_flowchart() {
    let file = sql_file(SCENARIO);
    let output = ctegraph(&["-f", "mermaid", file.path().to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("flowchart TD"));
    assert!(stdout.contains("b --> c"));
}

#[test]
fn table_output_is_default() {
    let file = sql_file(SCENARIO);
    let output = ctegraph(&[file.path().to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ctegraph lineage"));
    assert!(stdout.contains("(main)"));
}

#[test]
fn layout_output_positions_every_node() {
    let file = sql_file(SCENARIO);
    let output = ctegraph(&["-f", "layout", file.path().to_str().unwrap()]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let nodes = json["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert!(nodes.iter().all(|node| node["position"]["y"].is_number()));
    assert_eq!(json["edges"].as_array().unwrap().len(), 3);
}

#[test]
fn parse_error_exits_with_failure() {
    let file = sql_file("SELECT * FROM");
    let output = ctegraph(&[file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ctegraph: error: Parse error"));
}

#[test]
fn unsupported_source_exits_with_failure() {
    let file = sql_file("SELECT * FROM (SELECT 1) AS sub");
    let output = ctegraph(&[file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unexpected table expression kind: derived"));
}

#[test]
fn missing_file_is_a_config_error() {
    let output = ctegraph(&["/nonexistent/query.sql"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn watch_requires_a_file() {
    let output = ctegraph(&["--watch"]);
    assert!(!output.status.success());
}
