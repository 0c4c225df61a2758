//! `hottest gen` end to end, through the built binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn chunks() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "runtime/header.json", "{}");
    write(root, "runtime/header.sh", "set -e\n");
    write(root, "runtime/footer.json", "{}");
    write(root, "runtime/footer.sh", "echo done\n");
    write(
        root,
        "boards/evk.json",
        r#"{ "description": "evk", "node-labels": ["arm64"], "environment-variables": { "SERIAL": "/dev/ttyUSB0" } }"#,
    );
    write(root, "boards/evk.sh", "echo board\n");
    write(
        root,
        "tests/boot.json",
        r#"{ "test-labels": ["boot"], "parameters": { "TIMEOUT": { "default": "30" } } }"#,
    );
    write(root, "tests/boot.sh", "#|board-require-env <SERIAL>\nboot $TIMEOUT\n");
    write(
        root,
        "slow.json",
        r#"{ "parameter-default-overrides": { "TIMEOUT": "300" } }"#,
    );
    dir
}

fn hottest(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hottest").unwrap();
    cmd.env("HOME", home).env("RUST_LOG", "off");
    cmd
}

#[test]
fn job_script_starts_with_shebang_and_marks_chunks() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "job", "-c", c, "-b", "boards/evk", "-t", "tests/boot", "-o", "script"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#!/bin/bash\n"))
        .stdout(predicate::str::contains("# File contents of: "))
        .stdout(predicate::str::contains("boot $TIMEOUT\n"));
}

#[test]
fn job_xml_applies_param_file() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    let overlay = dir.path().join("slow.json");
    hottest(dir.path())
        .args(["gen", "job", "-c", c, "-b", "boards/evk", "-t", "tests/boot", "-l", "lab"])
        .arg("-p")
        .arg(&overlay)
        .assert()
        .success()
        .stdout(predicate::str::contains("<defaultValue>300</defaultValue>"))
        .stdout(predicate::str::contains("<assignedNode>"));
}

#[test]
fn job_metadata_lists_name() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "job", "-c", c, "-b", "boards/evk", "-t", "tests/boot", "-o", "metadata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[name       ] boot-evk"));
}

#[test]
fn node_xml_carries_env_vars() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "node", "-c", c, "-b", "boards/evk", "-n", "evk-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<name>evk-1</name>"))
        .stdout(predicate::str::contains("/dev/ttyUSB0"));
}

#[test]
fn reserved_node_name_fails() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "node", "-c", c, "-b", "boards/evk", "-n", "master"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn node_has_no_script_output() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "node", "-c", c, "-b", "boards/evk", "-n", "evk-1", "-o", "script"])
        .assert()
        .failure();
}

#[test]
fn missing_chunk_is_reported() {
    let dir = chunks();
    let c = dir.path().to_str().unwrap();
    hottest(dir.path())
        .args(["gen", "job", "-c", c, "-b", "boards/evk", "-t", "tests/nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tests/nope"));
}

#[test]
fn pipeline_script_prefixes_jobs_with_root_folder() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nightly.json");
    std::fs::write(&file, r#"{ "main-execution-sequence": ["boot-evk"] }"#).unwrap();
    hottest(dir.path())
        .args(["gen", "pipeline", "--root-folder", "team", "-o", "script", "-f"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("team/boot-evk"));
}

#[test]
fn folder_document_is_static() {
    let dir = TempDir::new().unwrap();
    hottest(dir.path())
        .args(["gen", "folder"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<com.cloudbees.hudson.plugins.folder.Folder",
        ));
}
