//! Tests for the `suiterun` binary: exit codes, console output and the JSON report

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SUITERUN: &str = env!("CARGO_BIN_EXE_suiterun");
const COPY_PROGRAM: &str = env!("CARGO_BIN_EXE_suiterun-copy");

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("suites")).unwrap();
    fs::create_dir_all(dir.path().join("inputs")).unwrap();
    fs::write(dir.path().join("inputs/a.txt"), "hello").unwrap();
    fs::write(dir.path().join("suites/good.toml"), "[test.t1]\ninput = \"a.txt\"\n").unwrap();
    fs::write(dir.path().join("suites/bad.toml"), "[test.t1]\ninput = \"b.txt\"\n").unwrap();
    fs::write(dir.path().join("suites/broken.toml"), "[test.t1\ninput = \"a.txt\"\n").unwrap();
    dir
}

fn suiterun(dir: &Path, args: &[&str]) -> Output {
    Command::new(SUITERUN)
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_all_passing_exits_zero() {
    let dir = project();
    let output = suiterun(dir.path(), &["run", COPY_PROGRAM, "results", "good", "--no-color"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("t1 [PASS]"));
    assert!(out.contains("Suite good finished with status PASS"));
    assert!(!out.contains('\x1b'));
    assert!(stderr(&output).contains("====== 1 passed in "));
    assert!(dir.path().join("results/good/t1/t1.log").is_file());
}

#[test]
fn test_run_with_failure_exits_one() {
    let dir = project();
    let output = suiterun(dir.path(), &["run", COPY_PROGRAM, "results", "good", "bad", "--no-color"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Suite bad finished with status FAIL"));
    assert!(stderr(&output).contains("1 passed, 1 failed"));
}

#[test]
fn test_run_without_suites_is_usage_error() {
    let dir = project();
    let output = suiterun(dir.path(), &["run", COPY_PROGRAM, "results"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_run_rejects_bad_timeout() {
    let dir = project();
    let output = suiterun(dir.path(), &["run", COPY_PROGRAM, "results", "good", "--timeout", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--timeout must be a positive number"));
}

#[test]
fn test_run_writes_report() {
    let dir = project();
    let output = suiterun(
        dir.path(),
        &["run", COPY_PROGRAM, "results", "good", "bad", "--report", "report.json", "--no-color"],
    );
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report["passed"], false);
    assert_eq!(report["suites"][0]["name"], "good");
    assert_eq!(report["suites"][0]["tests"][0]["exit_code"], 0);
    assert_eq!(report["suites"][0]["tests"][0]["stdout_bytes"], 6);
    assert_eq!(report["suites"][1]["passed"], false);
    assert!(report["suites"][1]["error"].as_str().unwrap().contains("b.txt"));
}

#[test]
fn test_run_with_custom_directories() {
    let dir = project();
    fs::rename(dir.path().join("suites"), dir.path().join("cfg")).unwrap();
    fs::rename(dir.path().join("inputs"), dir.path().join("data")).unwrap();
    let output = suiterun(
        dir.path(),
        &[
            "run",
            COPY_PROGRAM,
            "out",
            "good",
            "--suites-dir",
            "cfg",
            "--inputs-dir",
            "data",
            "--scratch-dir",
            "tmp",
            "--copyback",
        ],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("out/good/t1/a.out")).unwrap(), "hello");
    assert!(dir.path().join("tmp").is_dir());
    assert!(!dir.path().join("__workdir").exists());
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_valid_suite() {
    let dir = project();
    let output = suiterun(dir.path(), &["check", "good", "bad"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "good: 1 test\nbad: 1 test\n");
}

#[test]
fn test_check_syntax_error_shows_diagnostic() {
    let dir = project();
    let output = suiterun(dir.path(), &["check", "broken"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("broken.toml"));
    assert!(err.contains("1 of 1 suite(s) failed to parse"));
}
