use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn tq() -> (Command, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::cargo_bin("tq").expect("binary");
    cmd.current_dir(dir.path());
    cmd.env_clear();
    (cmd, dir)
}

#[test]
fn help_lists_subcommands() {
    let (mut cmd, _dir) = tq();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("traces"))
        .stdout(predicate::str::contains("projects"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn traces_list_rejects_bad_filter_before_any_remote_call() {
    // No token and no project configured: the translation error must win.
    let (mut cmd, _dir) = tq();
    cmd.args(["traces", "list", "badfilter"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "bad filter [badfilter]. Must be in form [key]:[value]",
        ));
}

#[test]
fn traces_list_rejects_malformed_label_filter() {
    let (mut cmd, _dir) = tq();
    cmd.args(["traces", "list", "LABEL:badfilter"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "bad filter [LABEL:badfilter]. Must be in form LABEL:[key]:[value]",
        ));
}

#[test]
fn traces_list_rejects_zero_limit() {
    let (mut cmd, _dir) = tq();
    cmd.args(["traces", "list", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit must be greater than 0"));
}

#[test]
fn traces_list_rejects_invalid_since_timestamp() {
    let (mut cmd, _dir) = tq();
    cmd.args(["traces", "list", "--since", "notatime"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timestamp 'notatime'"));
}

#[test]
fn traces_view_requires_trace_id() {
    let (mut cmd, _dir) = tq();
    cmd.args(["traces", "view"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--trace-id"));
}

#[test]
fn projects_list_requires_token() {
    let (mut cmd, _dir) = tq();
    cmd.args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing access token"));
}

#[test]
fn project_resolution_requires_tty_when_unset() {
    let (mut cmd, _dir) = tq();
    cmd.env("TQ_ACCESS_TOKEN", "dummy")
        .args(["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires TTY"));
}

#[test]
fn explicit_env_file_must_exist() {
    let (mut cmd, _dir) = tq();
    cmd.args(["--env-file", "missing.env", "traces", "list", "key:v"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read env file"));
}

#[test]
fn env_file_supplies_credentials() {
    let (mut cmd, dir) = tq();
    fs::write(
        dir.path().join(".env"),
        "TQ_ACCESS_TOKEN=dummy\nTQ_RESOURCE_API_URL=http://127.0.0.1:9\n",
    )
    .expect("write env file");

    // The token check passes (proving the env file loaded); the failure
    // comes from the unreachable endpoint instead.
    cmd.args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request to").or(predicate::str::contains("failed")))
        .stderr(predicate::str::contains("missing access token").not());
}
