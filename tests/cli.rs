#![allow(missing_docs)]

mod support;

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use graphsketch::{
    retrieve_metadata, QueryCompiler, Sketch, SketchEdge, SketchVertex, Value,
};
use serde_json::Value as Json;
use support::{raw_node, raw_rel, result_row, social_catalog};
use tempfile::TempDir;

fn knows_sketch() -> Sketch {
    Sketch {
        vertices: vec![
            SketchVertex::new("A", Some("Person")),
            SketchVertex::new("B", Some("Person")),
        ],
        edges: vec![SketchEdge::new("A", "B", false, Some("KNOWS"))],
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write");
        path
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> PathBuf {
        self.write(name, &serde_json::to_string_pretty(value).expect("json"))
    }

    /// Config path that does not exist, so every run starts from defaults.
    fn no_config(&self) -> PathBuf {
        self.dir.path().join("absent.toml")
    }
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8")
}

fn stderr_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).expect("utf8")
}

fn search_fixture(ws: &Workspace, sketch: &Sketch) -> PathBuf {
    let graph = sketch.to_graph().expect("graph");
    let meta = retrieve_metadata(&social_catalog()).expect("metadata");
    let query = QueryCompiler::default()
        .with_metadata(std::sync::Arc::new(meta))
        .translate(&graph);
    let db = social_catalog().with_response(
        query.text(),
        vec![result_row(
            vec![
                raw_node(101, "Person", &[("name", Value::from("Ada"))]),
                raw_node(102, "Person", &[("name", Value::from("Alan"))]),
            ],
            vec![raw_rel(55, 101, 102, "KNOWS")],
            vec![(vec![101, 102], vec![55])],
        )],
    );
    ws.write("fixture.json", &db.to_json().expect("fixture json"))
}

fn run(ws: &Workspace, args: &[&str], extra: &[&Path]) -> assert_cmd::assert::Assert {
    cargo_bin_cmd!("graphsketch")
        .arg("--config")
        .arg(ws.no_config())
        .args(["--theme", "plain"])
        .args(args)
        .args(extra)
        .env_remove("GRAPHSKETCH_CONFIG")
        .assert()
}

#[test]
fn compile_prints_the_query_text() {
    let ws = Workspace::new();
    let drawing = ws.write_json("drawing.json", &knows_sketch());
    let out = stdout_of(run(&ws, &["compile"], &[&drawing]).success());
    assert!(out.starts_with("MATCH (n0:Person)-[r0:KNOWS]-(n1:Person)\nWHERE id(n0) <= id(n1)\n"));
    assert!(out.trim_end().ends_with("resultIds"));
}

#[test]
fn symmetry_flag_overrides_the_policy() {
    let ws = Workspace::new();
    let drawing = ws.write_json("drawing.json", &knows_sketch());
    let out = stdout_of(
        run(&ws, &["--symmetry", "preserve", "compile"], &[&drawing]).success(),
    );
    assert!(!out.contains("WHERE"));
}

#[test]
fn config_file_sets_compiler_options() {
    let ws = Workspace::new();
    let drawing = ws.write_json("drawing.json", &knows_sketch());
    let config = ws.write(
        "config.toml",
        "[compiler]\nsymmetry = \"preserve\"\nnode_prefix = \"v\"\n",
    );
    let out = stdout_of(
        cargo_bin_cmd!("graphsketch")
            .arg("--config")
            .arg(&config)
            .arg("compile")
            .arg(&drawing)
            .assert()
            .success(),
    );
    assert!(out.starts_with("MATCH (v0:Person)-[r0:KNOWS]-(v1:Person)\nWITH "));
}

#[test]
fn invalid_config_is_reported_with_its_code() {
    let ws = Workspace::new();
    let drawing = ws.write_json("drawing.json", &knows_sketch());
    let config = ws.write("config.toml", "[compiler]\nsymmetry = \"sometimes\"\n");
    let err = stderr_of(
        cargo_bin_cmd!("graphsketch")
            .arg("--config")
            .arg(&config)
            .arg("compile")
            .arg(&drawing)
            .assert()
            .failure(),
    );
    assert!(err.contains("[Config]"));
}

#[test]
fn validate_reports_disconnected_drawings() {
    let ws = Workspace::new();
    let mut sketch = knows_sketch();
    sketch.vertices.push(SketchVertex::new("C", Some("Company")));
    let drawing = ws.write_json("drawing.json", &sketch);
    let err = stderr_of(run(&ws, &["validate"], &[&drawing]).failure());
    assert!(err.contains("[Disconnected]"));
}

#[test]
fn validate_emits_the_canonical_graph_as_json() {
    let ws = Workspace::new();
    let drawing = ws.write_json("drawing.json", &knows_sketch());
    let out = stdout_of(run(&ws, &["--format", "json", "validate"], &[&drawing]).success());
    let json: Json = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["nodes"].as_object().map(|m| m.len()), Some(2));
    assert_eq!(json["relations"]["0"]["start"], 0);
}

#[test]
fn search_runs_against_a_replay_fixture() {
    let ws = Workspace::new();
    let sketch = knows_sketch();
    let drawing = ws.write_json("drawing.json", &sketch);
    let fixture = search_fixture(&ws, &sketch);

    let out = stdout_of(
        cargo_bin_cmd!("graphsketch")
            .arg("--config")
            .arg(ws.no_config())
            .args(["--format", "json", "search"])
            .arg(&drawing)
            .arg("--replay")
            .arg(&fixture)
            .env_remove("GRAPHSKETCH_CONFIG")
            .assert()
            .success(),
    );
    let json: Json = serde_json::from_str(&out).expect("valid json");
    assert_eq!(json["ids"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["ids"][0]["nodes"], serde_json::json!([101, 102]));
}

#[test]
fn metadata_prints_the_catalog_tree() {
    let ws = Workspace::new();
    let fixture = ws.write("catalog.json", &social_catalog().to_json().expect("json"));
    let out = stdout_of(run(&ws, &["metadata", "--replay"], &[&fixture]).success());
    assert!(out.starts_with("Database Metadata\n"));
    assert!(out.contains("Person: 3"));
}

#[test]
fn assemble_decodes_a_saved_row() {
    let ws = Workspace::new();
    let row = result_row(
        vec![raw_node(1, "Person", &[]), raw_node(2, "Person", &[])],
        vec![raw_rel(3, 1, 2, "KNOWS")],
        vec![(vec![1, 2], vec![3]), (vec![2, 1], vec![3])],
    );
    let record = ws.write_json("row.json", &row);

    let text = stdout_of(run(&ws, &["assemble"], &[&record]).success());
    assert!(text.starts_with("Query Results\n"));

    let json: Json = serde_json::from_str(&stdout_of(
        run(&ws, &["--format", "json", "--symmetry", "dedup", "assemble"], &[&record]).success(),
    ))
    .expect("valid json");
    assert_eq!(json["ids"].as_array().map(Vec::len), Some(1));
}
