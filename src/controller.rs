//! Run-level control: settings, suite fan-out and the aggregate outcome.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use suiterun_config::OptionSchema;
use thiserror::Error;

use crate::executor::{ExecError, ExecutionContext, ProgramRunner, SubprocessRunner};
use crate::log::{Console, LogSink};
use crate::source::{DirectorySuiteSource, SuiteSource};
use crate::suite::{SuiteOrchestrator, SuiteResult};
use crate::workspace::{Workspace, WorkspaceError};

pub const DEFAULT_SUITES_DIR: &str = "suites";
pub const DEFAULT_INPUTS_DIR: &str = "inputs";
pub const DEFAULT_SCRATCH_DIR: &str = "__workdir";

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot prepare results directory: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("cannot write report '{}': {source}", .path.display())]
    Report { path: PathBuf, source: std::io::Error },

    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything a run needs besides the target and the suite names.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub results_dir: PathBuf,
    pub suites_dir: PathBuf,
    pub inputs_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub copy_back: bool,
    pub interpreter: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub console: Console,
    pub schema: OptionSchema,
}

impl HarnessSettings {
    /// Settings with the conventional `suites/`, `inputs/` and `__workdir/` locations.
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            suites_dir: PathBuf::from(DEFAULT_SUITES_DIR),
            inputs_dir: PathBuf::from(DEFAULT_INPUTS_DIR),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            copy_back: false,
            interpreter: None,
            timeout: None,
            console: Console::detect(),
            schema: OptionSchema::default(),
        }
    }
}

/// Results of every suite in a run, in run order.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub suites: Vec<SuiteResult>,
    pub duration: Duration,
}

impl RunOutcome {
    /// True iff at least one suite ran and every suite passed.
    pub fn passed(&self) -> bool {
        !self.suites.is_empty() && self.suites.iter().all(|s| s.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.suites.iter().filter(|s| s.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.suites.len() - self.passed_count()
    }
}

pub struct RunController {
    settings: HarnessSettings,
    source: Box<dyn SuiteSource>,
    runner: Box<dyn ProgramRunner>,
    workspace: Workspace,
}

impl RunController {
    /// A controller reading suites from `settings.suites_dir` and spawning real processes.
    pub fn new(settings: HarnessSettings) -> Result<Self, HarnessError> {
        let source = Box::new(DirectorySuiteSource::new(&settings.suites_dir));
        let runner = Box::new(SubprocessRunner::new(settings.timeout)?);
        Ok(Self::with_parts(settings, source, runner))
    }

    pub fn with_parts(
        settings: HarnessSettings,
        source: Box<dyn SuiteSource>,
        runner: Box<dyn ProgramRunner>,
    ) -> Self {
        let workspace = Workspace::new(settings.console);
        Self {
            settings,
            source,
            runner,
            workspace,
        }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Run `suites` in order against `target`.
    ///
    /// Every suite is prepared and configured before the first one runs. One suite failing never
    /// stops another; only failing to set up the results root is an error.
    #[tracing::instrument(skip_all, fields(target = %target.display()))]
    pub fn run(&self, target: &Path, suites: &[String]) -> Result<RunOutcome, HarnessError> {
        let start = Instant::now();
        let settings = &self.settings;
        self.workspace.ensure_directory_exists(&settings.results_dir, true)?;

        let console_log = LogSink::new(settings.console);
        let mut seen = HashSet::new();
        let mut orchestrators = Vec::with_capacity(suites.len());
        for name in suites {
            if !seen.insert(name.as_str()) {
                console_log.warn(&format!("Suite {name} given more than once, running it once"));
                continue;
            }
            let mut suite = SuiteOrchestrator::new(name, &settings.results_dir, LogSink::new(settings.console));
            suite.prepare_workspace(&self.workspace);
            suite.configure(self.source.as_ref(), &settings.schema, &settings.inputs_dir);
            orchestrators.push(suite);
        }

        let ctx = ExecutionContext {
            workspace: &self.workspace,
            runner: self.runner.as_ref(),
            scratch_dir: &settings.scratch_dir,
            interpreter: settings.interpreter.as_deref(),
        };
        let results: Vec<SuiteResult> = orchestrators
            .into_iter()
            .map(|suite| suite.run(&ctx, target, settings.copy_back))
            .collect();

        let outcome = RunOutcome {
            suites: results,
            duration: start.elapsed(),
        };
        tracing::debug!(
            passed = outcome.passed_count(),
            failed = outcome.failed_count(),
            elapsed = ?outcome.duration,
            "run finished"
        );
        Ok(outcome)
    }
}
