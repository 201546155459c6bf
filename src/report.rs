//! Machine-readable run report.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::controller::{HarnessError, RunOutcome};
use crate::executor::RunResult;
use crate::suite::SuiteResult;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub passed: bool,
    pub duration_ms: u128,
    pub suites: Vec<SuiteReport>,
}

#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tests: Vec<TestReport>,
}

#[derive(Debug, Serialize)]
pub struct TestReport {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub stdout_bytes: usize,
    pub stderr_bytes: usize,
    pub copied_back: Vec<PathBuf>,
}

impl From<&RunOutcome> for RunReport {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            passed: outcome.passed(),
            duration_ms: outcome.duration.as_millis(),
            suites: outcome.suites.iter().map(SuiteReport::from).collect(),
        }
    }
}

impl From<&SuiteResult> for SuiteReport {
    fn from(suite: &SuiteResult) -> Self {
        Self {
            name: suite.name.clone(),
            passed: suite.passed,
            error: suite.error.clone(),
            tests: suite.tests.iter().map(TestReport::from).collect(),
        }
    }
}

impl From<&RunResult> for TestReport {
    fn from(test: &RunResult) -> Self {
        Self {
            name: test.test.clone(),
            passed: test.passed,
            exit_code: test.exit_code(),
            duration_ms: test.duration.as_millis(),
            failure: test.failure.clone(),
            stdout_bytes: test.stdout.len(),
            stderr_bytes: test.stderr.len(),
            copied_back: test.copied_back.clone(),
        }
    }
}

/// Serialize `outcome` as pretty JSON into `path`.
pub fn write_report(path: &Path, outcome: &RunOutcome) -> Result<(), HarnessError> {
    let json = serde_json::to_string_pretty(&RunReport::from(outcome))?;
    fs::write(path, json + "\n").map_err(|source| HarnessError::Report {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::executor::Termination;
    use std::time::Duration;

    fn outcome() -> RunOutcome {
        let mut passing = RunResult::not_run("t1", String::new());
        passing.passed = true;
        passing.failure = None;
        passing.termination = Some(Termination::Exited(0));
        passing.stdout = b"Done!\n".to_vec();
        passing.duration = Duration::from_millis(12);
        passing.copied_back = vec![PathBuf::from("results/smoke/t1/a.txt")];

        RunOutcome {
            suites: vec![
                SuiteResult {
                    name: "smoke".to_string(),
                    passed: true,
                    tests: vec![passing],
                    error: None,
                    duration: Duration::from_millis(15),
                },
                SuiteResult {
                    name: "absent".to_string(),
                    passed: false,
                    tests: Vec::new(),
                    error: Some("Suite configuration 'absent' not found".to_string()),
                    duration: Duration::ZERO,
                },
            ],
            duration: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_string_pretty(&RunReport::from(&outcome())).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "passed": false,
          "duration_ms": 20,
          "suites": [
            {
              "name": "smoke",
              "passed": true,
              "tests": [
                {
                  "name": "t1",
                  "passed": true,
                  "exit_code": 0,
                  "duration_ms": 12,
                  "stdout_bytes": 6,
                  "stderr_bytes": 0,
                  "copied_back": [
                    "results/smoke/t1/a.txt"
                  ]
                }
              ]
            },
            {
              "name": "absent",
              "passed": false,
              "error": "Suite configuration 'absent' not found",
              "tests": []
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_write_report_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &outcome()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["suites"][1]["name"], "absent");
        assert_eq!(value["passed"], false);
    }

    #[test]
    fn test_write_report_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_report(&dir.path().join("no/such/report.json"), &outcome()).unwrap_err();
        assert!(matches!(err, HarnessError::Report { .. }));
    }
}
