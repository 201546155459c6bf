//! Test case execution.
//!
//! ## Process boundary
//!
//! Spawning the target program goes through the [`ProgramRunner`] trait so the executor's
//! classification, artifact and scratch handling can be exercised without real processes.
//! [`SubprocessRunner`] is the production implementation.
//!
//! ## One execution
//!
//! 1. Invoke `target <input> <scratch>/<stem>.out <options...>`
//! 2. Persist non-empty stdout/stderr as `<program-stem>.stdout` / `.stderr`
//! 3. Classify on exit status (and expected output, when declared)
//! 4. Log one PASS/FAIL line to console and the test's log file
//! 5. Copy back input and output for passing tests, if asked
//! 6. Drain the scratch directory, whatever happened above

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use suiterun_config::{TestDefinition, is_plain_name};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::log::{self, Console, LogSink};
use crate::workspace::{Workspace, WorkspaceError};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch '{}': {source}", .program.display())]
    Launch { program: PathBuf, source: io::Error },

    #[error("failed to wait for '{}': {source}", .program.display())]
    Wait { program: PathBuf, source: io::Error },

    #[error("failed to start process runtime: {0}")]
    Runtime(#[source] io::Error),
}

// ============================================================================
// Process boundary
// ============================================================================

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The program under test.
    pub program: PathBuf,
    /// Runs `program` as its first argument when set, e.g. `python3`.
    pub interpreter: Option<PathBuf>,
    /// Arguments after the program.
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Executable to spawn and its full argument list.
    pub fn command_line(&self) -> (OsString, Vec<OsString>) {
        match &self.interpreter {
            Some(interpreter) => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.program.clone().into_os_string());
                args.extend(self.args.iter().cloned());
                (interpreter.clone().into_os_string(), args)
            }
            None => (self.program.clone().into_os_string(), self.args.clone()),
        }
    }
}

/// How a finished process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Killed by a signal; the number is known on unix.
    Signaled(Option<i32>),
    TimedOut(Duration),
}

/// Everything captured from one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub termination: Termination,
}

/// Runs a target program to completion and captures its output.
pub trait ProgramRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError>;
}

/// Spawns real processes, optionally killing them after a timeout.
///
/// Each call blocks the calling thread until the child exits; a current-thread tokio runtime
/// is only used to race the child against the timeout. Output read before a timeout is kept.
#[derive(Debug)]
pub struct SubprocessRunner {
    runtime: tokio::runtime::Runtime,
    timeout: Option<Duration>,
}

impl SubprocessRunner {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ExecError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecError::Runtime)?;
        Ok(Self { runtime, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl ProgramRunner for SubprocessRunner {
    #[tracing::instrument(skip_all, fields(program = %invocation.program.display()))]
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError> {
        let (program, args) = invocation.command_line();
        self.runtime.block_on(async {
            let mut child = tokio::process::Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| ExecError::Launch {
                    program: PathBuf::from(&program),
                    source,
                })?;

            let mut stdout_pipe = child.stdout.take();
            let mut stderr_pipe = child.stderr.take();
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let collect = async {
                let (out, err, status) = tokio::join!(
                    read_pipe(stdout_pipe.as_mut(), &mut stdout),
                    read_pipe(stderr_pipe.as_mut(), &mut stderr),
                    child.wait(),
                );
                out.and(err).and(status)
            };
            let finished = match self.timeout {
                None => Ok(collect.await),
                Some(limit) => tokio::time::timeout(limit, collect).await.map_err(|_| limit),
            };

            let termination = match finished {
                Ok(status) => termination_of(status.map_err(|source| ExecError::Wait {
                    program: PathBuf::from(&program),
                    source,
                })?),
                Err(limit) => {
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(error = %e, "could not kill timed out target");
                    }
                    let _ = child.wait().await;
                    tracing::debug!(?limit, stdout = stdout.len(), stderr = stderr.len(), "target timed out, killed");
                    Termination::TimedOut(limit)
                }
            };

            Ok(ProcessOutput {
                stdout,
                stderr,
                termination,
            })
        })
    }
}

/// Append everything readable from `pipe` to `buf`.
///
/// Bytes land in `buf` chunk by chunk, so a cancelled read keeps what arrived before it.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> io::Result<()> {
    let Some(pipe) = pipe else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn termination_of(status: std::process::ExitStatus) -> Termination {
    if let Some(code) = status.code() {
        return Termination::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        Termination::Signaled(status.signal())
    }
    #[cfg(not(unix))]
    {
        Termination::Signaled(None)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one test case execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub test: String,
    pub passed: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the program could not be launched at all.
    pub termination: Option<Termination>,
    pub duration: Duration,
    /// Diagnostic for a failed test.
    pub failure: Option<String>,
    /// Files copied into the test's result directory.
    pub copied_back: Vec<PathBuf>,
    /// False if the scratch directory could not be emptied afterwards.
    pub scratch_drained: bool,
}

impl RunResult {
    /// A failed result for a test whose program never ran.
    pub fn not_run(test: &str, failure: String) -> Self {
        Self {
            test: test.to_string(),
            passed: false,
            stdout: Vec::new(),
            stderr: Vec::new(),
            termination: None,
            duration: Duration::ZERO,
            failure: Some(failure),
            copied_back: Vec::new(),
            scratch_drained: true,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Some(Termination::Exited(code)) => Some(code),
            _ => None,
        }
    }
}

/// Where a stream capture is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// `<program-stem>.<stream>`, the artifact name for a captured stream.
pub fn stream_artifact_name(program: &Path, kind: StreamKind) -> String {
    let stem = program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    format!("{stem}.{kind}")
}

/// Decide pass/fail from how the process ended. `Err` carries the diagnostic.
pub fn classify(program: &Path, termination: Termination) -> Result<(), String> {
    match termination {
        Termination::Exited(0) => Ok(()),
        Termination::Exited(code) => Err(format!("{} returned with code {}", program.display(), code)),
        Termination::Signaled(Some(signal)) => {
            Err(format!("{} was terminated by signal {}", program.display(), signal))
        }
        Termination::Signaled(None) => Err(format!("{} was terminated by a signal", program.display())),
        Termination::TimedOut(limit) => Err(format!(
            "{} timed out after {}s",
            program.display(),
            limit.as_secs_f64()
        )),
    }
}

/// Byte-exact comparison of a produced output file against an expected one.
pub fn compare_output(produced: &Path, expected: &Path) -> Result<(), String> {
    let expected_bytes = fs::read(expected)
        .map_err(|e| format!("cannot read expected output '{}': {}", expected.display(), e))?;
    let produced_bytes = match fs::read(produced) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(format!("no output file '{}' was produced", produced.display()));
        }
        Err(e) => return Err(format!("cannot read output '{}': {}", produced.display(), e)),
    };
    if produced_bytes == expected_bytes {
        return Ok(());
    }

    let mut msg = format!(
        "output '{}' differs from expected '{}'",
        produced.display(),
        expected.display()
    );
    if let (Ok(produced), Ok(expected)) = (std::str::from_utf8(&produced_bytes), std::str::from_utf8(&expected_bytes)) {
        let line = first_differing_line(produced, expected);
        msg.push_str(&format!(" (first difference at line {line})"));
    }
    Err(msg)
}

fn first_differing_line(a: &str, b: &str) -> usize {
    let mut a_lines = a.lines();
    let mut b_lines = b.lines();
    let mut line: usize = 1;
    loop {
        match (a_lines.next(), b_lines.next()) {
            (Some(x), Some(y)) if x == y => line += 1,
            // Same lines but different trailing newline: report the last line.
            (None, None) => return line.saturating_sub(1).max(1),
            _ => return line,
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Shared resources every test execution in a run uses.
pub struct ExecutionContext<'a> {
    pub workspace: &'a Workspace,
    pub runner: &'a dyn ProgramRunner,
    pub scratch_dir: &'a Path,
    pub interpreter: Option<&'a Path>,
}

/// Runs one [`TestDefinition`] and persists its artifacts.
#[derive(Debug)]
pub struct TestCaseExecutor<'a> {
    test: &'a TestDefinition,
    results_dir: PathBuf,
    log: LogSink,
}

impl<'a> TestCaseExecutor<'a> {
    /// Reset `<suite_dir>/<test>/` and open its log file.
    pub fn prepare(
        test: &'a TestDefinition,
        suite_dir: &Path,
        workspace: &Workspace,
        console: Console,
    ) -> Result<Self, WorkspaceError> {
        // The directory is wiped; it must stay inside `suite_dir`.
        if !is_plain_name(&test.name) {
            return Err(WorkspaceError::InvalidName {
                name: test.name.clone(),
            });
        }
        let results_dir = suite_dir.join(&test.name);
        workspace.ensure_clean_directory(&results_dir, true)?;
        let log_path = results_dir.join(format!("{}.log", test.name));
        let log = LogSink::with_file(console, &log_path).map_err(|source| WorkspaceError::Create {
            path: log_path,
            source,
        })?;
        Ok(Self {
            test,
            results_dir,
            log,
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Run the target once for this test.
    pub fn run(&self, ctx: &ExecutionContext<'_>, target: &Path, copy_back: bool) -> RunResult {
        let start = Instant::now();
        let output_path = ctx.scratch_dir.join(&self.test.output);

        let mut args: Vec<OsString> = vec![
            self.test.input.clone().into_os_string(),
            output_path.clone().into_os_string(),
        ];
        args.extend(self.test.options.iter().map(OsString::from));
        let invocation = Invocation {
            program: target.to_path_buf(),
            interpreter: ctx.interpreter.map(Path::to_path_buf),
            args,
        };
        tracing::debug!(test = %self.test.name, ?invocation, "running test case");

        let mut result = RunResult {
            failure: None,
            ..RunResult::not_run(&self.test.name, String::new())
        };

        let verdict = match ctx.runner.run(&invocation) {
            Err(e) => Err(e.to_string()),
            Ok(output) => {
                result.termination = Some(output.termination);
                result.stdout = output.stdout;
                result.stderr = output.stderr;
                self.persist_streams(target, &result)
                    .and_then(|()| classify(target, output.termination))
                    .and_then(|()| match &self.test.expected {
                        Some(expected) => compare_output(&output_path, expected),
                        None => Ok(()),
                    })
            }
        };
        result.duration = start.elapsed();

        match verdict {
            Ok(()) => {
                result.passed = true;
                self.log.info(&format!("{} [{}]", self.test.name, log::paint("PASS", log::PASS)));
            }
            Err(msg) => {
                self.log
                    .info(&format!("{} [{}] {}", self.test.name, log::paint("FAIL", log::FAIL), msg));
                result.failure = Some(msg);
            }
        }

        if copy_back && result.passed {
            result.copied_back = self.copy_back(ctx.workspace, target, &output_path);
        }

        if let Err(e) = ctx.workspace.drain_directory(ctx.scratch_dir) {
            self.log.error(&format!("Scratch directory could not be drained: {e}"));
            result.scratch_drained = false;
            result.passed = false;
            if result.failure.is_none() {
                result.failure = Some(e.to_string());
            }
        }

        tracing::debug!(test = %self.test.name, passed = result.passed, elapsed = ?result.duration, "test case finished");
        result
    }

    fn persist_streams(&self, target: &Path, result: &RunResult) -> Result<(), String> {
        for (kind, bytes) in [(StreamKind::Stdout, &result.stdout), (StreamKind::Stderr, &result.stderr)] {
            if bytes.is_empty() {
                continue;
            }
            let path = self.results_dir.join(stream_artifact_name(target, kind));
            fs::write(&path, bytes).map_err(|e| format!("cannot write {} to '{}': {}", kind, path.display(), e))?;
        }
        Ok(())
    }

    /// Copy the input, then the produced output, into the results directory.
    ///
    /// Never replaces the test log, the stream captures or a file copied earlier in the same
    /// call; a colliding copy is skipped with a warning.
    fn copy_back(&self, workspace: &Workspace, target: &Path, output_path: &Path) -> Vec<PathBuf> {
        let mut taken: Vec<OsString> = vec![
            OsString::from(format!("{}.log", self.test.name)),
            OsString::from(stream_artifact_name(target, StreamKind::Stdout)),
            OsString::from(stream_artifact_name(target, StreamKind::Stderr)),
        ];
        let mut copied = Vec::new();
        copied.extend(self.copy_artifact(workspace, "input", &self.test.input, &mut taken));
        if output_path.is_file() {
            copied.extend(self.copy_artifact(workspace, "output", output_path, &mut taken));
        } else {
            self.log.warn(&format!(
                "{} produced no output '{}' to copy back",
                self.test.name,
                output_path.display()
            ));
        }
        copied
    }

    fn copy_artifact(
        &self,
        workspace: &Workspace,
        what: &str,
        source: &Path,
        taken: &mut Vec<OsString>,
    ) -> Option<PathBuf> {
        let Some(name) = source.file_name() else {
            self.log
                .warn(&format!("Copy-back of {what} skipped: '{}' has no file name", source.display()));
            return None;
        };
        if taken.iter().any(|t| t == name) {
            self.log.warn(&format!(
                "Copy-back of {what} skipped: '{}' would overwrite '{}'",
                source.display(),
                self.results_dir.join(name).display()
            ));
            return None;
        }
        taken.push(name.to_os_string());
        match workspace.copy_into(source, &self.results_dir) {
            Ok(dest) => Some(dest),
            Err(e) => {
                self.log.warn(&format!("Copy-back of {what} failed: {e}"));
                None
            }
        }
    }
}
