//! End-to-end tests for the `yamlstar` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn yamlstar(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_yamlstar"))
        .args(args)
        .env_remove("YAMLSTAR_DEBUG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn yamlstar");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_json_output() {
    let out = yamlstar(&["-t", "compact"], "b: 1\na: [x, ~]\n");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "{\"b\":1,\"a\":[\"x\",null]}\n");
}

#[test]
fn test_pretty_json_is_default() {
    let out = yamlstar(&[], "a: 1\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "{\n  \"a\": 1\n}\n");
}

#[test]
fn test_all_documents() {
    let out = yamlstar(&["-a", "-t", "compact", "-"], "--- 1\n--- two\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "[1,\"two\"]\n");
}

#[test]
fn test_multiple_documents_need_all() {
    let out = yamlstar(&[], "--- 1\n--- 2\n");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out).trim(),
        "<stdin>:2:1: expected a single document but found 2"
    );
}

#[test]
fn test_error_diagnostic() {
    let out = yamlstar(&["--check"], "key: \"unclosed");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out).trim(),
        "<stdin>:1:6: unterminated double-quoted scalar"
    );
}

#[test]
fn test_check_ok() {
    let out = yamlstar(&["--check"], "a: 1\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "<stdin>: ok\n");
}

#[test]
fn test_envelope() {
    let out = yamlstar(&["--envelope"], "a: 1");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "{\"data\":{\"a\":1}}\n");

    let out = yamlstar(&["--envelope"], "a: *nope");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).starts_with("{\"error\":{\"kind\":\"ComposeError\""));
}

#[test]
fn test_toml_output() {
    let out = yamlstar(&["-t", "toml"], "name: demo\nport: 80\n");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "name = \"demo\"\nport = 80\n");

    let out = yamlstar(&["-t", "toml"], "- not a table\n");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_cbor_output() {
    let out = yamlstar(&["-t", "cbor"], "[1, true]");
    assert!(out.status.success());
    assert_eq!(out.stdout, vec![0x82, 0x01, 0xf5]);

    let out = yamlstar(&["-t", "diag"], "[1, true]");
    assert_eq!(stdout(&out), "[1, true]\n");
}

#[test]
fn test_bad_arguments() {
    assert_eq!(yamlstar(&["-t", "xml"], "").status.code(), Some(1));
    assert_eq!(yamlstar(&["--bogus"], "").status.code(), Some(1));
}

#[test]
fn test_version() {
    let out = yamlstar(&["-V"], "");
    assert_eq!(
        stdout(&out),
        format!("yamlstar {}\n", env!("CARGO_PKG_VERSION"))
    );
}
