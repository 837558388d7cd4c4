//! CLI argument parsing and exit code tests.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn walkmod() -> Command {
    Command::cargo_bin("walkmod").expect("walkmod binary")
}

fn create_yaml_project(contents: &str) -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    fs::write(td.path().join("walkmod.yml"), contents).unwrap();
    td
}

#[test]
fn test_add_plugin_writes_detected_yaml_document() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .arg("add-plugin")
        .arg("org.walkmod:myplugin:1.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("updated"));

    let written = fs::read_to_string(temp.path().join("walkmod.yml")).unwrap();
    assert!(written.contains("org.walkmod:myplugin:1.0"), "{written}");
}

#[test]
fn test_second_run_reports_no_changes() {
    let temp = create_yaml_project("");

    for _ in 0..2 {
        walkmod()
            .current_dir(temp.path())
            .args(["add-module", "core", "web"])
            .assert()
            .success();
    }
    let before = fs::read_to_string(temp.path().join("walkmod.yml")).unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add_modules: no changes"));
    assert_eq!(
        fs::read_to_string(temp.path().join("walkmod.yml")).unwrap(),
        before
    );
}

#[test]
fn test_missing_document_defaults_to_xml() {
    let temp = tempfile::tempdir().expect("tempdir");

    walkmod()
        .current_dir(temp.path())
        .args(["add-plugin", "imports-cleaner"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let written = fs::read_to_string(temp.path().join("walkmod.xml")).unwrap();
    assert!(
        written.contains("walkmod-imports-cleaner-plugin"),
        "{written}"
    );
}

#[test]
fn test_project_dir_and_format_flags() {
    let temp = tempfile::tempdir().expect("tempdir");
    let project = temp.path().join("nested");
    fs::create_dir_all(&project).unwrap();

    walkmod()
        .arg("add-transformation")
        .arg("walkmod:commons:imports-cleaner")
        .arg("--project-dir")
        .arg(&project)
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let written = fs::read_to_string(project.join("walkmod.json")).unwrap();
    assert!(
        written.contains("walkmod:commons:imports-cleaner"),
        "{written}"
    );
}

#[test]
fn test_dry_run_prints_patch_without_writing() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+- \"core\""));

    assert_eq!(
        fs::read_to_string(temp.path().join("walkmod.yml")).unwrap(),
        ""
    );
}

#[test]
fn test_dry_run_from_config_file() {
    let temp = create_yaml_project("");
    fs::write(
        temp.path().join(".walkmod.toml"),
        "[defaults]\ndry_run = true\n",
    )
    .unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("walkmod.yml")).unwrap(),
        ""
    );
}

#[test]
fn test_backup_flag_keeps_previous_contents() {
    let temp = create_yaml_project("modules:\n- \"core\"\n");

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "web", "--backup"])
        .assert()
        .success();

    let backup = fs::read_to_string(temp.path().join("walkmod.yml.walkmod.bak")).unwrap();
    assert_eq!(backup, "modules:\n- \"core\"\n");
}

#[test]
fn test_out_dir_receives_artifacts() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core", "--out-dir", "artifacts"])
        .assert()
        .success();

    assert!(temp.path().join("artifacts").join("patch.diff").exists());
    let json = fs::read_to_string(temp.path().join("artifacts").join("edit.json")).unwrap();
    assert!(json.contains("\"action\": \"add_modules\""), "{json}");
}

#[test]
fn test_malformed_plugin_exits_with_user_error() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .args(["add-plugin", "a:b"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("malformed plugin identifier"));
}

#[test]
fn test_malformed_provider_leaves_document_alone() {
    let temp = create_yaml_project("providers:\n- type: \"org.walkmod:walkmod-x-plugin:x\"\n");

    walkmod()
        .current_dir(temp.path())
        .args(["rm-provider", "x", "a::b"])
        .assert()
        .code(2);

    let contents = fs::read_to_string(temp.path().join("walkmod.yml")).unwrap();
    assert!(contents.contains("walkmod-x-plugin"), "{contents}");
}

#[test]
fn test_unparsable_document_exits_with_user_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("walkmod.xml"), "<walkmod><chain").unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_param_format_missing_equals() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .args(["set-reader", "--param", "keyonly"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing value"));
}

#[test]
fn test_invalid_param_format_empty_key() {
    let temp = create_yaml_project("");

    walkmod()
        .current_dir(temp.path())
        .args(["set-writer", "--param", "=value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing key"));
}

#[test]
fn test_invalid_format_is_rejected_by_clap() {
    walkmod()
        .args(["inspect", "--format", "ini"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration format"));
}

#[test]
fn test_rm_chain_requires_a_name() {
    walkmod()
        .arg("rm-chain")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_invalid_config_file_exits_with_user_error() {
    let temp = create_yaml_project("");
    fs::write(temp.path().join(".walkmod.toml"), "[defaults\n").unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["add-module", "core"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".walkmod.toml"));
}

#[test]
fn test_apply_request_file() {
    let temp = create_yaml_project("transformations:\n- type: \"t1\"\n");
    fs::write(
        temp.path().join("request.json"),
        r#"{"action": "remove_transformations", "types": ["t1"]}"#,
    )
    .unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["apply-request", "request.json"])
        .assert()
        .success();

    let contents = fs::read_to_string(temp.path().join("walkmod.yml")).unwrap();
    assert!(!contents.contains("t1"), "{contents}");
}

#[test]
fn test_apply_request_rejects_unknown_action() {
    let temp = create_yaml_project("");
    fs::write(temp.path().join("request.json"), r#"{"action": "explode"}"#).unwrap();

    walkmod()
        .current_dir(temp.path())
        .args(["apply-request", "request.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse request"));
}

#[test]
fn test_inspect_missing_document() {
    let temp = tempfile::tempdir().expect("tempdir");

    walkmod()
        .current_dir(temp.path())
        .arg("inspect")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration file not found"));

    walkmod()
        .current_dir(temp.path())
        .args(["inspect", "--allow-missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(missing)"));
    assert!(!temp.path().join("walkmod.xml").exists());
}

#[test]
fn test_inspect_summarizes_flat_document() {
    let temp = create_yaml_project("transformations:\n- type: \"t1\"\n");

    walkmod()
        .current_dir(temp.path())
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("chain default"))
        .stdout(predicate::str::contains("    t1"));
}

#[test]
fn test_inspect_json() {
    let temp = create_yaml_project("modules:\n- \"core\"\n");

    let output = walkmod()
        .current_dir(temp.path())
        .args(["inspect", "--json"])
        .output()
        .expect("run inspect");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["documents"][0]["format"], "yaml");
    assert_eq!(value["documents"][0]["configuration"]["modules"][0], "core");
}
