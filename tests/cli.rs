//! Integration tests for the foundry-editor binary.
//!
//! These tests run the `validate` command against documents and schemas
//! written to a temporary directory.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PURL_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["idspace"],
  "properties": {
    "idspace": {"type": "string"},
    "base_url": {
      "type": "string",
      "pattern": "^/obo/",
      "level": "warning",
      "description": "base_url should live under /obo/"
    }
  },
  "additionalProperties": false
}"#;

/// Get a command for running foundry-editor.
fn foundry_editor() -> Command {
    let mut cmd = Command::cargo_bin("foundry-editor").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A temp directory holding a config that points at a local PURL schema.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let schema = dir.child("purl.schema.json");
    schema.write_str(PURL_SCHEMA).unwrap();
    dir.child("editor.toml")
        .write_str(&format!(
            "[purl]\nschemas = [{:?}]\n",
            schema.path().display().to_string()
        ))
        .unwrap();
    dir
}

fn validate(dir: &TempDir, kind: &str, file: &str) -> assert_cmd::assert::Assert {
    foundry_editor()
        .arg("validate")
        .arg("--type")
        .arg(kind)
        .arg(dir.child(file).path())
        .arg("--config")
        .arg(dir.child("editor.toml").path())
        .assert()
}

#[test]
fn help_lists_commands() {
    foundry_editor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn version_flag_works() {
    foundry_editor()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("foundry-editor"));
}

#[test]
fn valid_purl_config_passes() {
    let dir = workspace();
    dir.child("agro.yml")
        .write_str("idspace: AGRO\nbase_url: /obo/agro\n")
        .unwrap();

    validate(&dir, "purl", "agro.yml")
        .success()
        .stdout(predicate::str::contains("agro.yml: valid"));
}

#[test]
fn schema_error_fails_with_report() {
    let dir = workspace();
    dir.child("agro.yml")
        .write_str("idspace: AGRO\nproducts: []\n")
        .unwrap();

    validate(&dir, "purl", "agro.yml")
        .failure()
        .stdout(predicate::str::contains(r#""result_type": "error""#))
        .stdout(predicate::str::contains(r#""line_number": 2"#));
}

#[test]
fn warnings_are_reported_but_pass() {
    let dir = workspace();
    dir.child("agro.yml")
        .write_str("idspace: AGRO\nbase_url: /agro\n")
        .unwrap();

    validate(&dir, "purl", "agro.yml")
        .success()
        .stdout(predicate::str::contains(r#""result_type": "warning""#))
        .stdout(predicate::str::contains("base_url should live under /obo/"));
}

#[test]
fn idspace_must_match_filename() {
    let dir = workspace();
    dir.child("go.yml").write_str("idspace: AGRO\n").unwrap();

    validate(&dir, "purl", "go.yml")
        .failure()
        .stdout(predicate::str::contains(r#""result_type": "error""#));
}

#[test]
fn yaml_syntax_error_fails() {
    let dir = workspace();
    dir.child("agro.yml").write_str("idspace: [AGRO\n").unwrap();

    validate(&dir, "purl", "agro.yml")
        .failure()
        .stdout(predicate::str::contains("YAML parsing error"));
}

#[test]
fn registry_entry_without_front_matter_fails() {
    let dir = workspace();
    dir.child("agro.md").write_str("# Agronomy\n").unwrap();

    validate(&dir, "registry", "agro.md")
        .failure()
        .stdout(predicate::str::contains("Front matter error"));
}

#[test]
fn registry_entry_with_matching_id_passes() {
    let dir = workspace();
    dir.child("agro.md")
        .write_str("---\nlayout: ontology_detail\nid: agro\ntitle: Agronomy Ontology\n---\n\nBody\n")
        .unwrap();

    validate(&dir, "registry", "agro.md")
        .success()
        .stdout(predicate::str::contains("agro.md: valid"));
}

#[test]
fn missing_document_is_an_error() {
    let dir = workspace();

    validate(&dir, "purl", "absent.yml")
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    dir.child("agro.yml").write_str("idspace: AGRO\n").unwrap();

    foundry_editor()
        .arg("validate")
        .arg("--type")
        .arg("purl")
        .arg(dir.child("agro.yml").path())
        .arg("--config")
        .arg(dir.child("nope.toml").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn unknown_type_is_rejected_by_the_parser() {
    foundry_editor()
        .args(["validate", "--type", "wiki", "x.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'wiki'"));
}
