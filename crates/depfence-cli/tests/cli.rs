//! cli.rs
//!
//! Black-box runs of the `depfence` binary. Tests that need a Go toolchain
//! create a throwaway module and are skipped when `go` is not on PATH.

use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;

const POLICY: &str = r#"{
    "components": { "web": "example.com/m/web", "db": "example.com/m/db" },
    "constraints": [ { "scope": "web", "forbid": ["db"], "onBreak": "error" } ]
}"#;

fn depfence() -> Command {
    Command::cargo_bin("depfence").unwrap()
}

fn stderr(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn go_available() -> bool {
    StdCommand::new("go")
        .arg("version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Module `example.com/m` where `web` imports `db`.
fn write_module(dir: &Path) {
    fs::write(dir.join("go.mod"), "module example.com/m\n\ngo 1.18\n").unwrap();
    fs::create_dir_all(dir.join("db")).unwrap();
    fs::write(dir.join("db/db.go"), "package db\n").unwrap();
    fs::create_dir_all(dir.join("web")).unwrap();
    fs::write(
        dir.join("web/web.go"),
        "package web\n\nimport _ \"example.com/m/db\"\n",
    )
    .unwrap();
}

fn go_command(dir: &Path) -> Command {
    let mut cmd = depfence();
    cmd.current_dir(dir)
        .env("GOFLAGS", "-mod=mod")
        .env("GOWORK", "off")
        .env("GOCACHE", dir.join(".gocache"));
    cmd
}

#[test]
fn policy_flag_is_required() {
    let out = depfence().args(["policy", "enforce"]).output().unwrap();
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--policy"));
}

#[test]
fn missing_policy_file_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let out = depfence()
        .args(["policy", "show", "--policy"])
        .arg(dir.path().join("nope.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Unable to open policy file"));
}

#[test]
fn invalid_policy_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    fs::write(
        &path,
        r#"{"components": {"a": "x/*"}, "constraints": [{"scope": "a", "allow": ["a"], "onBreak": "fatal"}]}"#,
    )
    .unwrap();

    let out = depfence().args(["policy", "show", "--policy"]).arg(&path).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown severity"));
}

#[test]
fn log_none_silences_errors() {
    let dir = tempfile::tempdir().unwrap();
    let out = depfence()
        .args(["--log", "none", "policy", "show", "--policy"])
        .arg(dir.path().join("nope.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stderr.is_empty());
}

#[test]
fn show_prints_canonical_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    fs::write(
        &path,
        r#"{
            "components": { "web": "acme/web/*", "db": "acme/db/*" },
            "constraints": [ { "scope": "web", "allow": ["web"], "forbid": ["db"] } ]
        }"#,
    )
    .unwrap();

    let out = depfence().args(["policy", "show", "--policy"]).arg(&path).output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));

    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let constraints = doc["constraints"].as_array().unwrap();
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints[0]["scope"], "acme/web/*");
    assert_eq!(constraints[0]["allow"], serde_json::json!(["acme/web/*"]));
    assert_eq!(constraints[0]["onBreak"], "error");
    assert_eq!(constraints[1]["forbid"], serde_json::json!(["acme/db/*"]));
}

#[test]
fn enforce_reports_forbidden_dependency() {
    if !go_available() {
        eprintln!("skip: go toolchain not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path());
    let policy = dir.path().join("policy.json");
    fs::write(&policy, POLICY).unwrap();

    let out = go_command(dir.path())
        .args(["policy", "enforce", "--json", "--policy"])
        .arg(&policy)
        .output()
        .unwrap();
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(1), "{err}");
    assert!(err.contains("example.com/m/web depends on example.com/m/db"), "{err}");
    assert!(err.contains("found 1 error(s)"), "{err}");

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["ok"], false);
    assert_eq!(report["summary"]["errors"], 1);
    assert_eq!(report["summary"]["packages"], 2);
}

#[test]
fn enforce_passes_with_warnings_only() {
    if !go_available() {
        eprintln!("skip: go toolchain not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path());
    let policy = dir.path().join("policy.json");
    fs::write(&policy, POLICY.replace("\"error\"", "\"warn\"")).unwrap();

    let out = go_command(dir.path())
        .args(["policy", "enforce", "--policy"])
        .arg(&policy)
        .output()
        .unwrap();
    let err = stderr(&out);
    assert!(out.status.success(), "{err}");
    assert!(err.contains("example.com/m/web depends on example.com/m/db"), "{err}");
    assert!(err.contains("example.com/m/db does not have constraints"), "{err}");
}

#[test]
fn graph_writes_dot_file() {
    if !go_available() {
        eprintln!("skip: go toolchain not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path());
    let policy = dir.path().join("policy.json");
    fs::write(&policy, POLICY).unwrap();
    let dot = dir.path().join("deps.dot");

    let out = go_command(dir.path())
        .args(["deps", "graph", "--policy"])
        .arg(&policy)
        .arg(&dot)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        fs::read_to_string(&dot).unwrap(),
        "strict digraph deps {\n\"web\" -> \"db\"\n}\n"
    );

    let skipped = go_command(dir.path())
        .args(["deps", "graph", "--skip", "db", "--policy"])
        .arg(&policy)
        .output()
        .unwrap();
    assert!(skipped.status.success(), "{}", stderr(&skipped));
    assert_eq!(String::from_utf8_lossy(&skipped.stdout), "strict digraph deps {\n}\n");
}

#[cfg(unix)]
#[test]
fn go_list_failure_reports_its_stderr() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let go = bin.join("go");
    fs::write(&go, "#!/bin/sh\necho '  go: cannot find main module  ' >&2\nexit 1\n").unwrap();
    fs::set_permissions(&go, fs::Permissions::from_mode(0o755)).unwrap();

    let policy = dir.path().join("policy.json");
    fs::write(&policy, POLICY).unwrap();

    let out = depfence()
        .current_dir(dir.path())
        .env("PATH", &bin)
        .args(["policy", "enforce", "--policy"])
        .arg(&policy)
        .output()
        .unwrap();
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(1), "{err}");
    assert!(err.contains("Unable to list packages matching ./..."), "{err}");
    assert!(err.contains("go list ./... failed: go: cannot find main module"), "{err}");
}
