//! Integration tests for the `vigil` binary's dispatcher and bundled
//! commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::{contains, starts_with};
use tempfile::TempDir;
use vigil_config::CONFIG_ENV_VAR;

fn vigil() -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("vigil");
    command.env_remove(CONFIG_ENV_VAR).env("NO_COLOR", "1");
    command
}

#[test]
fn bare_invocation_lists_commands() {
    vigil().assert().success().stdout(
        contains("Available subcommands:")
            .and(contains("    digest"))
            .and(contains("    greet"))
            .and(contains("    inspect"))
            .and(contains("    settings")),
    );
}

#[test]
fn help_commands_is_machine_readable() {
    vigil()
        .args(["help", "--commands"])
        .assert()
        .success()
        .stdout(starts_with("digest\ngreet\n"));
}

#[test]
fn version_is_reported() {
    vigil()
        .arg("--version")
        .assert()
        .success()
        .stdout("0.1a1\n");
}

#[test]
fn unknown_command_exits_with_failure() {
    vigil()
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr("Unknown command: 'frobnicate'\nType 'vigil help' for usage.\n");
}

#[test]
fn inspect_reports_arguments_and_options() {
    vigil()
        .args(["inspect", "a", "b", "-o", "x", "--option", "y", "-v", "2"])
        .assert()
        .success()
        .stdout("args: a, b\noptions: x, y\nverbosity: 2\ntraceback: false\n");
}

#[test]
fn inspect_failures_are_one_line() {
    vigil()
        .args(["inspect", "--fail", "nope"])
        .assert()
        .code(1)
        .stderr("Error: nope\n");
}

#[test]
fn inspect_failures_with_traceback_show_the_stack() {
    vigil()
        .args(["inspect", "--fail", "nope", "--traceback"])
        .assert()
        .code(1)
        .stderr(starts_with("Error: nope\n").and(contains("Stack backtrace:")));
}

#[test]
fn inspect_writes_its_report_to_a_file() {
    let dir = TempDir::new().expect("temp dir");
    let report = dir.path().join("report.txt");

    vigil()
        .args(["inspect", "a", "--output"])
        .arg(&report)
        .assert()
        .success()
        .stdout("");

    assert_eq!(
        fs::read_to_string(&report).expect("report written"),
        "args: a\noptions: \nverbosity: 1\ntraceback: false\n"
    );
}

#[test]
fn inspect_keeps_an_existing_file_when_overwrite_is_declined() {
    let dir = TempDir::new().expect("temp dir");
    let report = dir.path().join("report.txt");
    fs::write(&report, "keep me\n").expect("seed report");
    let shown = report.display().to_string();

    vigil()
        .args(["inspect", "--output"])
        .arg(&report)
        .write_stdin("no\n")
        .assert()
        .code(1)
        .stdout(contains("Overwrite the file and permanently destroy its contents?"))
        .stderr(format!(
            "File exists at {shown}!\nError: Unable to write to file at {shown}\n"
        ));

    assert_eq!(fs::read_to_string(&report).expect("report kept"), "keep me\n");
}

#[test]
fn inspect_force_replaces_an_existing_file() {
    let dir = TempDir::new().expect("temp dir");
    let report = dir.path().join("report.txt");
    fs::write(&report, "old\n").expect("seed report");

    vigil()
        .args(["inspect", "b", "--force", "--output"])
        .arg(&report)
        .assert()
        .success();

    let contents = fs::read_to_string(&report).expect("report replaced");
    assert!(contents.starts_with("args: b\n"));
}

#[test]
fn unknown_options_are_usage_errors() {
    vigil()
        .args(["inspect", "--bogus"])
        .assert()
        .code(2)
        .stderr(contains("vigil inspect [options] [arg ...]"));
}

#[test]
fn greet_handles_each_name() {
    vigil()
        .args(["greet", "--shout", "ada", "grace"])
        .assert()
        .success()
        .stdout("HELLO, ADA!\nHELLO, GRACE!\n");
}

#[test]
fn greet_requires_a_name() {
    vigil()
        .arg("greet")
        .assert()
        .code(1)
        .stderr("Error: Enter at least one name.\n");
}

#[test]
fn digest_reports_invalid_paths_and_continues() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("hello.txt");
    fs::write(&file, "hello\n").expect("write file");
    let shown = file.display().to_string();

    vigil()
        .args(["digest", "/nonexistent/path", shown.as_str()])
        .assert()
        .success()
        .stdout(format!(
            "/nonexistent/path is not a valid file\n\
             5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03  {shown}\n"
        ));
}

#[test]
fn settings_rejects_arguments() {
    vigil()
        .args(["settings", "extra"])
        .assert()
        .code(1)
        .stderr("Error: Command doesn't accept any arguments.\n");
}

#[test]
fn settings_shows_the_configured_pidfile() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("daemon.toml");
    fs::write(&config, "pidfile = \"/run/demo/heartbeat.pid\"\n").expect("write config");

    vigil()
        .env(CONFIG_ENV_VAR, &config)
        .arg("settings")
        .assert()
        .success()
        .stdout(contains("\"pidfile\": \"/run/demo/heartbeat.pid\"").and(contains("\"stop\"")));
}

#[test]
fn settings_reports_malformed_files() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("daemon.toml");
    fs::write(&config, "pidfile = 3\n").expect("write config");

    vigil()
        .env(CONFIG_ENV_VAR, &config)
        .arg("settings")
        .assert()
        .code(1)
        .stderr(starts_with("Error: "));
}
