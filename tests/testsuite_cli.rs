//! End-to-end runs of the `testsuite` binary against a fake `run-test` script.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Stand-in for run-test: `$4` is the output dir, `$7` the test directory.
const FAKE_RUN_TEST: &str = r#"#!/bin/sh
out="$4"
name=$(basename "$7")
case "$name" in
  fail*)
    echo "DIFF:output mismatch" > "$out/$name.result"
    printf '%s\n' '-expected' '+actual' > "$out/$name.diff"
    exit 1 ;;
  crash*)
    echo "boom" >&2
    exit 3 ;;
  echo*)
    printf '%s\n' "$@" > "$out/$name.args" ;;
esac
echo "OK" > "$out/$name.result"
"#;

struct Suite {
    root: TempDir,
    script: PathBuf,
}

impl Suite {
    fn new(tests: &[&str]) -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("tests")).unwrap();
        for t in tests {
            fs::create_dir_all(root.path().join("tests").join(t)).unwrap();
        }
        fs::write(root.path().join("tests").join("README"), "not a test").unwrap();

        let script = root.path().join("run-test");
        fs::write(&script, FAKE_RUN_TEST).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        Self { root, script }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn run(&self, extra: &[&str]) -> Output {
        let mut args = vec!["--target", "x86_64-unknown-linux-gnu"];
        args.extend_from_slice(extra);
        self.run_raw(&args)
    }

    fn run_raw(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_testsuite"))
            .current_dir(self.path())
            .arg("--run-test")
            .arg(&self.script)
            .args(args)
            .env("RUST_LOG", "off")
            .output()
            .unwrap()
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).unwrap()
    }

    fn results(&self, dir: &str) -> Vec<String> {
        let mut lines: Vec<String> = self.read(&format!("{dir}/results")).lines().map(String::from).collect();
        lines.sort();
        lines
    }
}

#[test]
fn full_run_records_every_test_and_exits_zero() {
    let suite = Suite::new(&["ok_a", "ok_b", "fail_c", "crash_d"]);
    let output = suite.run(&["-j", "3"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        suite.results("output"),
        [
            "crash_d:CRASH:process exited with status 3",
            "fail_c:DIFF:output mismatch",
            "ok_a:OK",
            "ok_b:OK",
        ]
    );
    assert_eq!(suite.read("output/discs"), "ALL x86_64-linux x86_64-unknown-linux-gnu");

    let report = suite.read("output/report");
    assert!(report.starts_with("Summary\n"));
    assert!(report.contains("fail_c: DIFF: output mismatch"));
    assert!(report.contains("crash_d: CRASH: process exited with status 3"));
}

#[test]
fn single_test_filter_and_user_discriminants() {
    let suite = Suite::new(&["ok_a", "ok_b", "fail_c"]);
    let output = suite.run(&["-d", "fast,ALL", "-o", "out", "ok_b"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Running only test 'ok_b'"));
    assert_eq!(suite.results("out"), ["ok_b:OK"]);
    assert_eq!(suite.read("out/discs"), "ALL x86_64-linux x86_64-unknown-linux-gnu fast");
}

#[test]
fn diffs_are_printed_on_request() {
    let suite = Suite::new(&["fail_c"]);
    let output = suite.run(&["--diffs"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-expected\n+actual"));
}

#[test]
fn second_run_diffs_against_first() {
    let suite = Suite::new(&["ok_a", "fail_c"]);
    assert!(suite.run(&["-o", "first"]).status.success());

    fs::rename(suite.path().join("tests/fail_c"), suite.path().join("tests/ok_c")).unwrap();
    assert!(suite.run(&["-o", "second", "--old-result-dir", "first"]).status.success());

    let report = suite.read("second/report");
    assert!(report.contains("New tests\n  ok_c: OK\n"));
    assert!(report.contains("Removed tests\n  fail_c (was DIFF)\n"));
}

#[test]
fn rerun_clears_previous_artifacts() {
    let suite = Suite::new(&["fail_c"]);
    assert!(suite.run(&[]).status.success());
    assert!(suite.path().join("output/fail_c.diff").exists());

    fs::write(suite.path().join("output/keep.txt"), "mine").unwrap();
    fs::rename(suite.path().join("tests/fail_c"), suite.path().join("tests/ok_c")).unwrap();
    assert!(suite.run(&[]).status.success());

    assert!(!suite.path().join("output/fail_c.diff").exists());
    assert!(!suite.path().join("output/fail_c.result").exists());
    assert!(suite.path().join("output/keep.txt").exists());
    assert_eq!(suite.results("output"), ["ok_c:OK"]);
}

#[test]
fn no_tests_still_reports() {
    let suite = Suite::new(&[]);
    let output = suite.run(&[]);

    assert!(output.status.success());
    assert_eq!(suite.read("output/report"), "");
    assert!(suite.path().join("output/discs").exists());
}

#[test]
fn gnat_target_runs_and_is_forwarded() {
    let suite = Suite::new(&["echo_a"]);
    let output = suite.run_raw(&["--target=x86-linux"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(suite.results("output"), ["echo_a:OK"]);
    assert_eq!(suite.read("output/discs"), "ALL x86-linux");

    let args: Vec<String> = suite.read("output/echo_a.args").lines().map(String::from).collect();
    assert_eq!(args[..2], ["-d", "ALL,x86-linux"]);
    assert_eq!(args.last().map(String::as_str), Some("--target=x86-linux"));
}

#[test]
fn fatal_errors_print_error_prefix() {
    let suite = Suite::new(&["ok_a"]);
    fs::write(suite.path().join("blocker"), "").unwrap();
    let output = suite.run(&["-o", "blocker/out"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ERROR: cannot create"), "stderr: {stderr}");
    assert!(!suite.path().join("output").exists());
}

#[test]
fn bad_option_syntax_fails_before_running() {
    let suite = Suite::new(&["ok_a"]);
    let output = suite.run(&["--jobs", "zero"]);

    assert!(!output.status.success());
    assert!(!suite.path().join("output").exists());
}
