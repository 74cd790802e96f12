//! Integration tests for the `linecall` binary entry point.
//!
//! Drives the binary over real pipes and checks that standard output carries
//! only protocol lines.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

const SETTINGS: [&str; 5] = [
    "LINECALL_ENV",
    "LINECALL_DEBUG",
    "LINECALL_LOG_FILTER",
    "LINECALL_LOG_FORMAT",
    "LINECALL_ON_MALFORMED",
];

fn linecall() -> Command {
    let mut command = cargo_bin_cmd!("linecall");
    for name in SETTINGS {
        command.env_remove(name);
    }
    command
}

#[test]
fn answers_calls_on_stdout() {
    let mut command = linecall();
    command.write_stdin(concat!(
        r#"{"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}"#,
        "\n",
        r#"{"rpc":{"op":"call"},"procedure":"missing","args":[],"kwargs":{}}"#,
        "\n",
        r#"{"rpc":{"op":"ping"}}"#,
        "\n",
    ));
    command.assert().success().stdout(concat!(
        r#"{"rpc":{"op":"return"},"result":5}"#,
        "\n",
        r#"{"rpc":{"op":"error"},"classe":"invalid_procedure","message":"missing"}"#,
        "\n",
        r#"{"rpc":{"op":"error"},"classe":"InvalidOperation","message":"Can't handle the RPC operation: ping"}"#,
        "\n",
    ));
}

#[test]
fn logs_stay_on_stderr() {
    let mut command = linecall();
    command
        .args(["--environment", "prod", "--debug", "--log-format", "json"])
        .write_stdin(concat!(r#"{"rpc":{"op":"call"},"procedure":"ping"}"#, "\n"));
    command
        .assert()
        .success()
        .stdout(concat!(r#"{"rpc":{"op":"return"},"result":"pong"}"#, "\n"))
        .stderr(contains("telemetry installed"))
        .stderr(contains(r#""environment":"prod""#))
        .stderr(contains(r#""filter":"debug""#))
        .stderr(contains("serving procedures"));
}

#[test]
fn empty_input_exits_cleanly() {
    let mut command = linecall();
    command.write_stdin("");
    command.assert().success().stdout("");
}

#[test]
fn help_succeeds() {
    let mut command = linecall();
    command.arg("--help");
    command.assert().success().stdout(contains("--on-malformed"));
}

#[test]
fn unknown_environment_fails_setup() {
    let mut command = linecall();
    command.env("LINECALL_ENV", "staging").write_stdin("");
    command
        .assert()
        .code(2)
        .stderr(contains("Unknown environment name: staging"));
}

#[test]
fn abort_policy_stops_on_malformed_input() {
    let mut command = linecall();
    command
        .args(["--on-malformed", "abort", "--log-filter", "off"])
        .write_stdin(concat!(
            r#"{"rpc":{"op":"call"},"procedure":"ping"}"#,
            "\n",
            "{not json\n",
            r#"{"rpc":{"op":"call"},"procedure":"ping"}"#,
            "\n",
        ));
    command
        .assert()
        .code(1)
        .stdout(concat!(r#"{"rpc":{"op":"return"},"result":"pong"}"#, "\n"))
        .stderr(contains("malformed request on line 2"));
}
