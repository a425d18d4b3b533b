// CLI behaviour: usage, config, scenario runs and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Run from an empty directory so no stray stockflow.toml or .env is picked up
fn stockflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stockflow").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_no_subcommand_shows_usage() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("stockflow scenario <file.toml>"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[workflow]"))
        .stdout(predicate::str::contains("code_length = 6"));
}

#[test]
fn test_config_env_override() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .arg("config")
        .env("STOCKFLOW_WORKFLOW__CODE_LENGTH", "8")
        .assert()
        .success()
        .stdout(predicate::str::contains("code_length = 8"));
}

#[test]
fn test_config_written_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("saved.toml");
    stockflow(&dir)
        .args(["config", "--output"])
        .arg(&out)
        .assert()
        .success();
    let saved = std::fs::read_to_string(&out).unwrap();
    assert!(saved.contains("enforce_roles = true"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[workflow]\ncode_length = 40\n").unwrap();
    stockflow(&dir)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("code_length"));
}

#[test]
fn test_transfer_demo_runs_clean() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .arg("scenario")
        .arg(demo("transfer_handoff.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("error code_mismatch"))
        .stdout(predicate::str::contains("VERIFIED_CONTROLLER"))
        .stdout(predicate::str::contains("HQ:2:AMX-01 = 170"))
        .stdout(predicate::str::contains("All steps ended as expected"));
}

#[test]
fn test_branch_day_demo_with_audit() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .args(["scenario", "--audit"])
        .arg(demo("branch_day.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("disposal.authorized"))
        .stdout(predicate::str::contains("condemned"));
}

#[test]
fn test_unexpected_outcome_fails_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[actors.admin]
role = "central_admin"

[[step]]
action = "request_disposal"
actor = "admin"
branch = "BR001"
reason = "Expired"
items = []
"#,
    )
    .unwrap();
    stockflow(&dir)
        .arg("scenario")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error empty_item_set"))
        .stderr(predicate::str::contains("1 unexpected outcome"));
}

#[test]
fn test_export_disposals_csv() {
    let dir = TempDir::new().unwrap();
    stockflow(&dir)
        .args(["export", "--kind", "disposals"])
        .arg(demo("branch_day.toml"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("kind,request_id,branch"))
        .stdout(predicate::str::contains("\"Cough syrup, 100ml\""))
        .stdout(predicate::str::contains("\"Expired, found during stock count\""))
        .stdout(predicate::str::contains("requisition").not());
}
