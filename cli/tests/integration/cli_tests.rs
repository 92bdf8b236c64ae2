//! Argument parsing and local-state checks of the `abx` binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn abx(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("abx"));
    cmd.env("NO_COLOR", "1")
        .env("ACROBOX_HOME", home.path())
        .env("ACROBOX_ADDR", "http://127.0.0.1:9")
        .env_remove("ACROBOX_HOST")
        .env_remove("ACROBOX_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn home() -> TempDir {
    TempDir::new().expect("tempdir")
}

// --- Help and version ---

#[test]
fn no_args_shows_help_and_exits_two() {
    let home = home();
    abx(&home).assert().code(2).stderr(predicate::str::contains(
        "Provision and operate an Acrobox appliance",
    ));
}

#[test]
fn help_lists_the_commands() {
    let home = home();
    abx(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("db/info"))
        .stdout(predicate::str::contains("redis-cli"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn hidden_flags_stay_out_of_help() {
    let home = home();
    abx(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--addr").not())
        .stdout(predicate::str::contains("--home").not());
}

#[test]
fn version_flag_names_the_binary() {
    let home = home();
    abx(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("abx"));
}

#[test]
fn init_help_shows_defaults() {
    let home = home();
    abx(&home)
        .args(["init", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nyc1"))
        .stdout(predicate::str::contains("s-1vcpu-1gb-intel"));
}

// --- Usage errors ---

#[test]
fn push_needs_a_source_and_a_target() {
    let home = home();
    abx(&home)
        .args(["push", "only-one"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn pull_needs_a_source_and_a_target() {
    let home = home();
    abx(&home).arg("pull").assert().code(2);
}

#[test]
fn exec_needs_a_command() {
    let home = home();
    abx(&home).args(["exec", "web"]).assert().code(2);
}

#[test]
fn deploy_needs_an_image() {
    let home = home();
    abx(&home).arg("deploy").assert().code(2);
}

#[test]
fn metrics_rejects_unknown_formats() {
    let home = home();
    abx(&home)
        .args(["metrics", "--format", "yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("term"));
}

#[test]
fn cancel_rejects_extra_arguments() {
    let home = home();
    abx(&home).args(["cancel", "now"]).assert().code(2);
}

// --- Local state ---

#[test]
fn status_without_state_reports_missing_machine() {
    let home = home();
    abx(&home)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Machine '"))
        .stderr(predicate::str::contains("does not exist."));
}

#[test]
fn ssh_without_state_reports_missing_machine() {
    let home = home();
    abx(&home)
        .args(["ssh", "uptime"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist."));
}

#[test]
fn daemon_commands_need_local_state_too() {
    let home = home();
    abx(&home)
        .args(["env/set", "image", "KEY=value with spaces"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist."));
}

#[test]
fn forced_cancel_without_state_never_contacts_the_service() {
    let home = home();
    abx(&home)
        .args(["cancel", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist."));
}

#[test]
fn forced_destroy_without_state_fails() {
    let home = home();
    abx(&home)
        .args(["destroy", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist."));
}

#[test]
fn init_refuses_an_existing_machine() {
    let home = home();
    let dir = home.path().join("acrobox");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("IPv4"), "203.0.113.10\n").expect("write");

    abx(&home)
        .args(["init", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists."));
}

#[test]
fn host_flag_selects_the_state_directory() {
    let home = home();
    let dir = home.path().join("staging");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("IPv4"), "203.0.113.10\n").expect("write");

    abx(&home)
        .args(["--host", "staging", "init", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("staging"))
        .stderr(predicate::str::contains("already exists."));
}

#[test]
fn unconfirmed_destroy_is_refused() {
    let home = home();
    abx(&home)
        .arg("destroy")
        .env_remove("CI")
        .env_remove("ACROBOX_YES")
        .write_stdin("wrong-name\n")
        .assert()
        .failure();
}

#[test]
fn database_and_container_commands_need_local_state() {
    for argv in [
        vec!["db/info"],
        vec!["psql", "-c", "select 1"],
        vec!["redis-cli", "ping"],
        vec!["metrics", "--format", "json"],
        vec!["restore", "--force"],
        vec!["deploy", "web:latest"],
    ] {
        let home = home();
        abx(&home)
            .args(&argv)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("does not exist."));
    }
}

#[test]
fn unconfirmed_restore_is_refused() {
    let home = home();
    abx(&home)
        .arg("restore")
        .env_remove("CI")
        .env_remove("ACROBOX_YES")
        .write_stdin("wrong-name\n")
        .assert()
        .failure();
}
