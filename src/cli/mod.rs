//! CLI module for the suite runner
//!
//! ## Commands
//!
//! - `run <program> <results-dir> <suite>...` - Run suites against a program
//! - `check <suite>...` - Parse suite files and report problems without running anything
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::controller::{DEFAULT_INPUTS_DIR, DEFAULT_SCRATCH_DIR, DEFAULT_SUITES_DIR};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Same code clap uses for argument errors.
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a usage error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run declarative test suites against an external program
#[derive(Parser, Debug)]
#[command(name = "suiterun")]
#[command(version = VERSION)]
#[command(about = "Run declarative test suites against an external program", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where suite files and their inputs live.
#[derive(Args, Debug, Clone)]
pub struct SuiteLocations {
    /// Directory holding `<suite>.toml` files
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SUITES_DIR)]
    pub suites_dir: PathBuf,
    /// Directory test inputs are resolved against
    #[arg(long, value_name = "DIR", default_value = DEFAULT_INPUTS_DIR)]
    pub inputs_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run suites against a program
    Run {
        /// Program under test
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,
        /// Directory receiving per-suite results
        #[arg(value_name = "RESULTS_DIR")]
        results_dir: PathBuf,
        /// Suites to run, in order
        #[arg(value_name = "SUITE", required = true)]
        suites: Vec<String>,
        /// Copy inputs and outputs of passing tests into their result directories
        #[arg(long)]
        copyback: bool,
        #[command(flatten)]
        locations: SuiteLocations,
        /// Shared scratch directory for program outputs
        #[arg(long, value_name = "DIR", default_value = DEFAULT_SCRATCH_DIR)]
        scratch_dir: PathBuf,
        /// Run the program through this interpreter (e.g. python3)
        #[arg(long, value_name = "PROG")]
        interpreter: Option<PathBuf>,
        /// Kill a test's program after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,
        /// Write a JSON report of the run to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
        /// Disable colored console output
        #[arg(long)]
        no_color: bool,
    },

    /// Parse suite files without running anything
    Check {
        /// Suites to check
        #[arg(value_name = "SUITE", required = true)]
        suites: Vec<String>,
        #[command(flatten)]
        locations: SuiteLocations,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            program,
            results_dir,
            suites,
            copyback,
            locations,
            scratch_dir,
            interpreter,
            timeout,
            report,
            no_color,
        } => commands::run_suites(commands::RunArgs {
            program,
            results_dir,
            suites,
            copy_back: copyback,
            suites_dir: locations.suites_dir,
            inputs_dir: locations.inputs_dir,
            scratch_dir,
            interpreter,
            timeout,
            report,
            no_color,
        }),
        Command::Check { suites, locations } => {
            commands::check_suites(&suites, &locations.suites_dir, &locations.inputs_dir)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
