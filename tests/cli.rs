use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = include_str!("../assets/data/site-content.json");
const SCHEMA: &str = include_str!("../assets/data/site-content.schema.json");

fn cli() -> Command {
    Command::cargo_bin("studiosite-cli").unwrap()
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

fn validate_cmd(content: &Path, schema: &Path) -> Command {
    let mut cmd = cli();
    cmd.arg("validate").arg("--content").arg(content).arg("--schema").arg(schema);
    cmd
}

#[test]
fn validate_passes_on_bundled_content() {
    let dir = TempDir::new().unwrap();
    let content = write(dir.path(), "content.json", FIXTURE);
    let schema = write(dir.path(), "schema.json", SCHEMA);

    validate_cmd(&content, &schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("Content validation passed."));
}

#[test]
fn validate_lists_numbered_violations() {
    let mut doc: Value = serde_json::from_str(FIXTURE).unwrap();
    doc.as_object_mut().unwrap().remove("seo");
    doc["site"]["contact_email"] = json!("not-an-email");

    let dir = TempDir::new().unwrap();
    let content = write(dir.path(), "content.json", &doc.to_string());
    let schema = write(dir.path(), "schema.json", SCHEMA);

    validate_cmd(&content, &schema)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Content validation failed:"))
        .stderr(predicate::str::contains("1. Missing required root key: seo"))
        .stderr(predicate::str::contains("2. site.contact_email must be a valid email address."))
        .stdout(predicate::str::contains("passed").not());
}

#[test]
fn validate_json_output_reports_violations() {
    let mut doc: Value = serde_json::from_str(FIXTURE).unwrap();
    doc["process_steps"] = json!([]);

    let dir = TempDir::new().unwrap();
    let content = write(dir.path(), "content.json", &doc.to_string());
    let schema = write(dir.path(), "schema.json", SCHEMA);

    let output = validate_cmd(&content, &schema).arg("--json").assert().failure().get_output().stdout.clone();
    let result: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["valid"], json!(false));
    assert_eq!(
        result["violations"][0]["message"],
        json!("process_steps must include exactly 3 steps.")
    );
}

#[test]
fn validate_rejects_unparseable_content() {
    let dir = TempDir::new().unwrap();
    let content = write(dir.path(), "content.json", "{ \"site\": ");
    let schema = write(dir.path(), "schema.json", SCHEMA);

    validate_cmd(&content, &schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON in"));
}

#[test]
fn validate_rejects_foreign_schema() {
    let dir = TempDir::new().unwrap();
    let content = write(dir.path(), "content.json", FIXTURE);
    let schema = write(dir.path(), "schema.json", r#"{"title": "Something Else"}"#);

    validate_cmd(&content, &schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HuTech Studio Site Content"));
}

#[test]
fn render_prints_content_driven_html() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "assets/data/site-content.json", FIXTURE);

    cli()
        .arg("render")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("We turn hard operational problems into working prototypes."))
        .stdout(predicate::str::contains("data-case-id=\"ops-triage\""))
        .stdout(predicate::str::contains("<title>HuTech Studio | Incubation and prototyping</title>"));
}

#[test]
fn render_falls_back_to_static_markup() {
    let dir = TempDir::new().unwrap();

    cli()
        .arg("render")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("We prototype what matters."));
}
