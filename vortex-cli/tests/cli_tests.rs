use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn vortex() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vortex"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    vortex()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vortex RDMA cgroup manager"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn test_version_command() {
    vortex()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vortex"));
}

#[test]
fn test_invalid_command() {
    vortex()
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_set_without_path() {
    vortex()
        .args(["set", "--limit", "mlx5_1:hca_handle=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_set_writes_rdma_max() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v2", "set", "--path"])
        .arg(dir.path())
        .args(["--limit", "mlx5_1:hca_handle=100,hca_object=300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mlx5_1: handles=100 objects=300"));

    let written = fs::read_to_string(dir.path().join("rdma.max")).unwrap();
    assert_eq!(written, "mlx5_1 hca_handle=100 hca_object=300");
}

#[test]
fn test_set_from_policy_file() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("policy.json");
    fs::write(&policy, r#"{"mlx5_1": {"hcaObjects": 42}}"#).unwrap();

    vortex()
        .args(["--hierarchy", "v1", "set", "--path"])
        .arg(dir.path())
        .arg("--policy")
        .arg(&policy)
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("rdma.max")).unwrap();
    assert_eq!(written, "mlx5_1 hca_object=42");
}

#[test]
fn test_set_empty_policy_detected_hierarchy() {
    let root = tempfile::tempdir().unwrap();
    let cg = tempfile::tempdir().unwrap();

    vortex()
        .arg("--cgroup-root")
        .arg(root.path())
        .args(["set", "--path"])
        .arg(cg.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No RDMA limits requested"));

    assert!(!cg.path().join("rdma.max").exists());
}

#[test]
fn test_set_invalid_limit() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v2", "set", "--path"])
        .arg(dir.path())
        .args(["--limit", "mlx5_1:hca_handle=max"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid limit"));
}

#[test]
fn test_stats_missing_path() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v2", "stats", "--path"])
        .arg(dir.path().join("gone"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No RDMA stats available"));
}

#[test]
fn test_stats_json_missing_path_is_null() {
    let dir = tempfile::tempdir().unwrap();

    let output = vortex()
        .args(["--hierarchy", "v2", "stats", "--json", "--path"])
        .arg(dir.path().join("gone"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.is_null());
}

#[test]
fn test_set_rejects_signed_limit() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v1", "set", "--limit", "mlx5_1:hca_handle=+5", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid limit"));
    assert!(!dir.path().join("rdma.max").exists());
}

#[test]
fn test_stats_table() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rdma.current"),
        "mlx5_1 hca_handle=10 hca_object=20\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("rdma.max"),
        "mlx5_1 hca_handle=100 hca_object=max\n",
    )
    .unwrap();

    vortex()
        .args(["--hierarchy", "v1", "stats", "--path"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("mlx5_1"))
        .stdout(predicate::str::contains("100"))
        .stdout(predicate::str::contains("max"));
}

#[test]
fn test_stats_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rdma.current"),
        "mlx5_1 hca_handle=10 hca_object=20\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("rdma.max"),
        "mlx5_1 hca_handle=100 hca_object=300\n",
    )
    .unwrap();

    let output = vortex()
        .args(["--hierarchy", "v2", "stats", "--json", "--path"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["limit"][0]["device"], "mlx5_1");
    assert_eq!(json["limit"][0]["hca_objects"], 300);
    assert_eq!(json["current"][0]["hca_handles"], 10);
}

#[test]
fn test_stats_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v2", "stats", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read RDMA stats"));
}

#[test]
fn test_apply_writes_pid() {
    let dir = tempfile::tempdir().unwrap();
    let cg = dir.path().join("box");

    vortex()
        .args(["--hierarchy", "v1", "apply", "--pid", "4321", "--path"])
        .arg(&cg)
        .assert()
        .success()
        .stdout(predicate::str::contains("Process 4321 attached"));

    assert_eq!(fs::read_to_string(cg.join("cgroup.procs")).unwrap(), "4321");
}

#[test]
fn test_apply_rejects_bad_pid() {
    let dir = tempfile::tempdir().unwrap();

    vortex()
        .args(["--hierarchy", "v1", "apply", "--pid", "zero", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid process ID"));
}
