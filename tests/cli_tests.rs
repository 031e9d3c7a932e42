//! Integration tests for the CLI surface
//!
//! These stay away from the interactive main loop; anything that would block
//! on terminal input is covered by the library tests instead.

use assert_cmd::Command;
use predicates::prelude::*;

fn ironrepl() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ironrepl"))
}

#[test]
fn test_cli_version() {
    let mut cmd = ironrepl();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("ironrepl"));
}

#[test]
fn test_cli_help_lists_the_flag_table() {
    let mut cmd = ironrepl();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Interactive command shell"))
        .stdout(predicate::str::contains("--classic"))
        .stdout(predicate::str::contains("--nobanner"))
        .stdout(predicate::str::contains("--quick"))
        .stdout(predicate::str::contains("--nosep"))
        .stdout(predicate::str::contains("--ext"))
        .stdout(predicate::str::contains("--exec"));
}

#[test]
fn test_unknown_color_scheme_is_fatal() {
    let mut cmd = ironrepl();
    cmd.args(["--quick", "--colors", "Plasma"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported color scheme"));
}

#[test]
fn test_unknown_exception_mode_is_fatal() {
    let mut cmd = ironrepl();
    cmd.args(["--quick", "--xmode", "Loud"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported exception mode"));
}

#[test]
fn test_deprecated_flag_warns_but_does_not_fail_parsing() {
    // Force a fatal construct afterwards so the process exits without
    // entering the main loop; the deprecation warning must still show up.
    let mut cmd = ironrepl();
    cmd.args(["--quick", "--pylab", "--colors", "Plasma"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("deprecated"))
        .stderr(predicate::str::contains("unsupported color scheme"));
}

#[test]
fn test_unknown_flags_are_rejected() {
    let mut cmd = ironrepl();
    cmd.arg("--definitely-not-a-flag");
    cmd.assert().failure().stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_negative_cache_size_is_fatal() {
    let mut cmd = ironrepl();
    cmd.args(["--quick", "--cache-size=-5"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cache_size must not be negative"));
}
