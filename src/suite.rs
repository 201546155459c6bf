//! Suite orchestration.
//!
//! A [`SuiteOrchestrator`] owns one suite from results directory to final status:
//!
//! ```text
//! Unconfigured --configure--> Configured --run--> Done(pass | fail)
//!       |                                   ^
//!       +--(prepare/configure error)--> Failed
//! ```
//!
//! [`SuiteOrchestrator::run`] takes `self`, so a suite runs at most once.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use suiterun_config::{OptionSchema, SuiteDefinition, is_plain_name};

use crate::executor::{ExecutionContext, RunResult, TestCaseExecutor};
use crate::log::{self, LogSink};
use crate::source::SuiteSource;
use crate::workspace::Workspace;

#[derive(Debug)]
enum SuiteState {
    Unconfigured,
    Configured(SuiteDefinition),
    /// Preparation or configuration failed; the suite will run nothing.
    Failed(String),
}

/// Outcome of a whole suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteResult {
    pub name: String,
    pub passed: bool,
    /// Results in execution order. Empty when the suite never got to run tests.
    pub tests: Vec<RunResult>,
    /// Why the suite failed without (or before finishing) running its tests.
    pub error: Option<String>,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct SuiteOrchestrator {
    name: String,
    dir: PathBuf,
    log: LogSink,
    state: SuiteState,
}

impl SuiteOrchestrator {
    pub fn new(name: &str, results_root: &Path, log: LogSink) -> Self {
        Self {
            name: name.to_string(),
            dir: results_root.join(name),
            log,
            state: SuiteState::Unconfigured,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<results>/<suite>/`
    pub fn results_dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SuiteState::Failed(_))
    }

    /// Number of configured tests, if configuration succeeded.
    pub fn test_count(&self) -> Option<usize> {
        match &self.state {
            SuiteState::Configured(definition) => Some(definition.len()),
            _ => None,
        }
    }

    /// Reset the suite's results directory and start its log file.
    pub fn prepare_workspace(&mut self, workspace: &Workspace) {
        if let Err(msg) = validate_suite_name(&self.name) {
            self.fail(msg);
            return;
        }
        if let Err(e) = workspace.ensure_clean_directory(&self.dir, true) {
            self.fail(format!("Cannot prepare results for suite {}: {}", self.name, e));
            return;
        }
        let log_path = self.dir.join(format!("{}.log", self.name));
        if let Err(e) = self.log.attach_file(&log_path) {
            self.fail(format!("Cannot open log file '{}': {}", log_path.display(), e));
        }
    }

    /// Load and parse the suite, then check that every input file exists.
    pub fn configure(&mut self, source: &dyn SuiteSource, schema: &OptionSchema, inputs_root: &Path) {
        if self.is_failed() {
            return;
        }
        let definition = match source
            .load(&self.name)
            .and_then(|text| SuiteDefinition::parse(&self.name, &text, inputs_root, schema))
        {
            Ok(definition) => definition,
            Err(e) => {
                self.log.error(&e.render());
                self.state = SuiteState::Failed(e.to_string());
                return;
            }
        };

        for test in definition.tests() {
            if !test.input.is_file() {
                self.fail(format!(
                    "Suite configuration '{}' invalid. Input '{}' of testcase `{}` is not a file.",
                    self.name,
                    test.input.display(),
                    test.name
                ));
                return;
            }
        }

        tracing::debug!(suite = %self.name, tests = definition.len(), "suite configured");
        self.state = SuiteState::Configured(definition);
    }

    /// Run every configured test against `target` and report the suite status.
    #[tracing::instrument(skip_all, fields(suite = %self.name))]
    pub fn run(self, ctx: &ExecutionContext<'_>, target: &Path, copy_back: bool) -> SuiteResult {
        let start = Instant::now();
        let (tests, error) = self.run_tests(ctx, target, copy_back);
        let passed = error.is_none() && !tests.is_empty() && tests.iter().all(|t| t.passed);

        let (status, style) = if passed { ("PASS", log::PASS) } else { ("FAIL", log::FAIL) };
        self.log.info(&format!(
            "{}{}",
            log::paint(&format!("Suite {} finished with status ", self.name), log::BOLD),
            log::paint(status, &format!("{}{}", log::BOLD, style))
        ));

        SuiteResult {
            name: self.name,
            passed,
            tests,
            error,
            duration: start.elapsed(),
        }
    }

    fn run_tests(&self, ctx: &ExecutionContext<'_>, target: &Path, copy_back: bool) -> (Vec<RunResult>, Option<String>) {
        if !is_valid_executable(target, ctx.interpreter.is_some()) {
            let msg = format!("Program `{}` is not a valid executable.", target.display());
            self.log.error(&msg);
            return (Vec::new(), Some(msg));
        }

        let definition = match &self.state {
            SuiteState::Configured(definition) => definition,
            SuiteState::Failed(msg) => return (Vec::new(), Some(msg.clone())),
            SuiteState::Unconfigured => {
                let msg = format!("Suite {} was never configured.", self.name);
                self.log.error(&msg);
                return (Vec::new(), Some(msg));
            }
        };
        if definition.is_empty() {
            let msg = format!("Suite configuration '{}' defines no tests.", self.name);
            self.log.error(&msg);
            return (Vec::new(), Some(msg));
        }

        if let Err(e) = ctx.workspace.ensure_clean_directory(ctx.scratch_dir, false) {
            let msg = format!("Cannot reset scratch directory: {e}");
            self.log.error(&msg);
            return (Vec::new(), Some(msg));
        }

        let mut results = Vec::with_capacity(definition.len());
        for test in definition.tests() {
            let executor = match TestCaseExecutor::prepare(test, &self.dir, ctx.workspace, self.log.console()) {
                Ok(executor) => executor,
                Err(e) => {
                    let msg = format!("Cannot prepare testcase `{}`: {}", test.name, e);
                    self.log.error(&msg);
                    results.push(RunResult::not_run(&test.name, msg));
                    continue;
                }
            };

            let result = executor.run(ctx, target, copy_back);
            let drained = result.scratch_drained;
            results.push(result);
            if !drained {
                let msg = format!(
                    "Scratch directory '{}' could not be drained; remaining tests of suite {} skipped.",
                    ctx.scratch_dir.display(),
                    self.name
                );
                self.log.error(&msg);
                return (results, Some(msg));
            }
        }
        (results, None)
    }

    fn fail(&mut self, msg: String) {
        self.log.error(&msg);
        self.state = SuiteState::Failed(msg);
    }
}

/// A suite name must be a single plain path component.
fn validate_suite_name(name: &str) -> Result<(), String> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(format!("Suite name '{name}' is not a valid directory name."))
    }
}

/// An existing regular file; on unix, without an interpreter, also executable by someone.
pub fn is_valid_executable(target: &Path, interpreted: bool) -> bool {
    let Ok(meta) = fs::metadata(target) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if !interpreted && meta.permissions().mode() & 0o111 == 0 {
            return false;
        }
    }
    #[cfg(not(unix))]
    let _ = interpreted;
    true
}
