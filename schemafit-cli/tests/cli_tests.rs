//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// Build command for the schemafit binary (finds it in target/debug when run via cargo test).
fn schemafit_cli() -> Command {
    cargo_bin_cmd!("schemafit")
}

/// A target netlist exactly matching the built-in `passthrough` template.
const PASSTHROUGH_TARGET: &str = r#"{
  "boxes": [
    { "id": "X1", "pins": { "left": 1, "top": 0, "right": 1, "bottom": 0 } }
  ],
  "connections": [
    { "ports": [ { "kind": "pin", "box_id": "X1", "pin": 1 }, { "kind": "net", "name": "IN" } ] },
    { "ports": [ { "kind": "pin", "box_id": "X1", "pin": 2 }, { "kind": "net", "name": "OUT" } ] }
  ],
  "nets": [ { "name": "IN" }, { "name": "OUT" } ]
}"#;

/// A target no built-in template is compatible with.
const LARGE_TARGET: &str = r#"{
  "boxes": [
    { "id": "U9", "pins": { "left": 6, "top": 3, "right": 6, "bottom": 3 } }
  ],
  "connections": [],
  "nets": []
}"#;

fn write_target(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let mut cmd = schemafit_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("adaptation"));
}

#[test]
fn test_cli_version() {
    let mut cmd = schemafit_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_templates_command() {
    let mut cmd = schemafit_cli();

    cmd.arg("templates");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("passthrough"))
        .stdout(predicate::str::contains("series-passive"));
}

#[test]
fn test_cli_templates_verbose() {
    let mut cmd = schemafit_cli();

    cmd.arg("templates").arg("--verbose");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("boxes"));
}

#[test]
fn test_cli_adapt_exact_target() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("adapt").arg(&target);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("passthrough"))
        .stdout(predicate::str::contains("No edits required"));
}

#[test]
fn test_cli_adapt_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("adapt")
        .arg(&target)
        .arg("--format")
        .arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"operations\""))
        .stdout(predicate::str::contains("\"model\""));
}

#[test]
fn test_cli_adapt_writes_model_file() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);
    let out = tmp.path().join("adapted.json");

    let mut cmd = schemafit_cli();
    cmd.arg("adapt")
        .arg(&target)
        .arg("--output")
        .arg(&out);

    cmd.assert().success();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"chips\""));
}

#[test]
fn test_cli_adapt_named_template() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("adapt")
        .arg(&target)
        .arg("--template")
        .arg("passthrough");

    cmd.assert().success();
}

#[test]
fn test_cli_adapt_unknown_template() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("adapt")
        .arg(&target)
        .arg("--template")
        .arg("no-such-template");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown template"));
}

#[test]
fn test_cli_adapt_nonexistent_file() {
    let mut cmd = schemafit_cli();

    cmd.arg("adapt").arg("does_not_exist.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_adapt_require_compatible_rejects() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", LARGE_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("adapt").arg(&target).arg("--require-compatible");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no template is compatible"));
}

#[test]
fn test_cli_adapt_templates_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let templates = tmp.path().join("templates");
    std::fs::create_dir(&templates).unwrap();
    std::fs::write(
        templates.join("bare-chip.json"),
        r#"{ "chips": [ { "id": "U1", "pins": { "left": 1, "top": 0, "right": 1, "bottom": 0 }, "origin": { "x": 0, "y": 0 } } ] }"#,
    )
    .unwrap();

    let mut cmd = schemafit_cli();
    cmd.arg("adapt")
        .arg(&target)
        .arg("--template")
        .arg("bare-chip")
        .arg("--templates-dir")
        .arg(&templates);

    // The bare chip lacks the labels; adapting adds them.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("add_label_to_pin").or(predicate::str::contains("label")));
}

#[test]
fn test_cli_score_command() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("score").arg(&target);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("passthrough"))
        .stdout(predicate::str::contains("decoupled-chip"));
}

#[test]
fn test_cli_score_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("score").arg(&target).arg("--format").arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"scores\""));
}

#[test]
fn test_cli_compat_exit_codes() {
    let tmp = tempfile::tempdir().unwrap();
    let exact = write_target(tmp.path(), "exact.json", PASSTHROUGH_TARGET);
    let large = write_target(tmp.path(), "large.json", LARGE_TARGET);

    let mut cmd = schemafit_cli();
    cmd.arg("compat")
        .arg(&exact)
        .arg("--template")
        .arg("passthrough");
    cmd.assert().code(0).stdout(predicate::str::contains("compatible"));

    let mut cmd = schemafit_cli();
    cmd.arg("compat")
        .arg(&large)
        .arg("--template")
        .arg("passthrough");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("not compatible"));
}

#[test]
fn test_cli_output_formats_are_different() {
    let tmp = tempfile::tempdir().unwrap();
    let target = write_target(tmp.path(), "target.json", PASSTHROUGH_TARGET);

    let mut cmd_human = schemafit_cli();
    cmd_human.arg("adapt").arg(&target).arg("--format").arg("human");
    let human_output = cmd_human.output().unwrap();

    let mut cmd_json = schemafit_cli();
    cmd_json.arg("adapt").arg(&target).arg("--format").arg("json");
    let json_output = cmd_json.output().unwrap();

    assert_ne!(
        human_output.stdout, json_output.stdout,
        "Different formats should produce different output"
    );
}
