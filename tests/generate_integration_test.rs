//! Integration tests for the generate command.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn get_binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_schema-diagram")
        .unwrap_or_else(|_| "target/debug/schema-diagram".to_string())
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn create_project(dir: &TempDir) -> PathBuf {
    let db = dir.path().join("db");
    fs::create_dir_all(&db).unwrap();
    fs::write(
        db.join("schema.rb"),
        r#"
ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  create_table "users", force: :cascade do |t|
    t.string "email", null: false
  end

  create_table "posts", force: :cascade do |t|
    t.bigint "user_id", null: false
    t.string "title"
    t.text "body"
  end

  create_table "audit_logs", force: :cascade do |t|
    t.string "action"
  end
end
"#,
    )
    .unwrap();
    dir.path().to_path_buf()
}

fn embedded_document(html: &str) -> serde_json::Value {
    let start = html.find("window.__SCHEMA_DATA__ = ").unwrap() + "window.__SCHEMA_DATA__ = ".len();
    let end = start + html[start..].find(";\n").unwrap();
    serde_json::from_str(&html[start..end].replace(r"<\/", "</")).unwrap()
}

#[test]
fn test_generate_default_output() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);

    let output = run_in(&root, &["generate"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Schema diagram generated: docs/schema.html"));
    assert!(stderr.contains("3 models"));

    let html = fs::read_to_string(root.join("docs/schema.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Database Schema</title>"));
    assert!(!html.contains("cdn"));

    let doc = embedded_document(&html);
    assert_eq!(doc["metadata"]["model_count"], 3);
    assert_eq!(doc["nodes"][0]["id"], "AuditLog");
    assert_eq!(doc["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_generate_flags_override_config() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);
    fs::write(
        root.join("schema-diagram.yml"),
        "title: From Config\ntheme: light\nexclude_models:\n  - Audit*\n",
    )
    .unwrap();

    let output = run_in(
        &root,
        &["generate", "--theme", "dark", "--expand-columns", "-o", "out/erd.html"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let html = fs::read_to_string(root.join("out/erd.html")).unwrap();
    assert!(html.contains("<title>From Config</title>"));
    assert!(html.contains(r#"<html lang="en" class="dark">"#));
    assert!(html.contains(r#""expand_columns":true"#));

    let doc = embedded_document(&html);
    assert_eq!(doc["metadata"]["model_count"], 2);
}

#[test]
fn test_generate_json_format() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);

    let output = run_in(&root, &["generate", "-o", "schema.json", "--exclude", "Post"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("schema.json")).unwrap()).unwrap();
    let ids: Vec<_> = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["AuditLog", "User"]);
    assert!(doc["edges"].as_array().unwrap().is_empty());
}

#[test]
fn test_generate_from_structure_sql() {
    let dir = TempDir::new().unwrap();
    let sql = dir.path().join("structure.sql");
    fs::write(
        &sql,
        "CREATE TABLE public.accounts (\n    id bigint NOT NULL,\n    name character varying\n);\nALTER TABLE ONLY public.accounts ADD CONSTRAINT accounts_pkey PRIMARY KEY (id);\n",
    )
    .unwrap();

    let output = run_in(
        dir.path(),
        &["generate", "--structure", "structure.sql", "--format", "json", "-o", "out.json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
    assert_eq!(doc["nodes"][0]["id"], "Account");
    assert_eq!(doc["nodes"][0]["columns"][0]["primary"], true);
    assert_eq!(doc["nodes"][0]["columns"][1]["type"], "string");
}

#[test]
fn test_generate_without_schema_writes_empty_diagram() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["generate"]);
    assert!(output.status.success());
    let html = fs::read_to_string(dir.path().join("docs/schema.html")).unwrap();
    assert_eq!(embedded_document(&html)["nodes"].as_array().unwrap().len(), 0);
}

#[test]
fn test_generate_invalid_values_fail() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);

    let output = run_in(&root, &["generate", "--format", "svg"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown format: svg"));

    let output = run_in(&root, &["generate", "--theme", "neon"]);
    assert!(!output.status.success());

    let output = run_in(&root, &["generate", "--schema", "missing.rb"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_generate_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);
    fs::write(root.join("schema-diagram.yml"), "theme: neon\n").unwrap();

    let output = run_in(&root, &["generate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config"));
}

#[test]
fn test_unwritable_output_fails() {
    let dir = TempDir::new().unwrap();
    let root = create_project(&dir);
    fs::write(root.join("blocker"), "").unwrap();

    let output = run_in(&root, &["generate", "-o", "blocker/schema.html"]);
    assert!(!output.status.success());
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("schema-diagram"));
}
