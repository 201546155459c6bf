//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use suiterun_config::{OptionSchema, SuiteDefinition};

use crate::controller::{HarnessSettings, RunController, RunOutcome};
use crate::log::{self, Console};
use crate::report::write_report;
use crate::source::{DirectorySuiteSource, SuiteSource};

use super::{CliError, CliResult, ExitCode};

/// Arguments of the `run` subcommand, after clap.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub program: PathBuf,
    pub results_dir: PathBuf,
    pub suites: Vec<String>,
    pub copy_back: bool,
    pub suites_dir: PathBuf,
    pub inputs_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub interpreter: Option<PathBuf>,
    pub timeout: Option<f64>,
    pub report: Option<PathBuf>,
    pub no_color: bool,
}

// ============================================================================
// run
// ============================================================================

/// Run every requested suite and exit non-zero unless all of them passed.
pub fn run_suites(args: RunArgs) -> CliResult<ExitCode> {
    let console = if args.no_color {
        Console::Stdout { color: false }
    } else {
        Console::detect()
    };
    let settings = HarnessSettings {
        suites_dir: args.suites_dir,
        inputs_dir: args.inputs_dir,
        scratch_dir: args.scratch_dir,
        copy_back: args.copy_back,
        interpreter: args.interpreter,
        timeout: parse_timeout(args.timeout)?,
        console,
        ..HarnessSettings::new(args.results_dir)
    };

    let controller =
        RunController::new(settings).map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    let outcome = controller
        .run(&args.program, &args.suites)
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if let Some(path) = &args.report {
        write_report(path, &outcome).map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    }

    let summary = summary_line(&outcome);
    let color = matches!(console, Console::Stdout { color: true });
    eprintln!("{}", if color { summary } else { log::strip_ansi(&summary) });

    Ok(if outcome.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Convert `--timeout` seconds into a duration, rejecting zero, negative and non-finite values.
fn parse_timeout(secs: Option<f64>) -> CliResult<Option<Duration>> {
    match secs {
        None => Ok(None),
        Some(s) if s.is_finite() && s > 0.0 => Ok(Some(Duration::from_secs_f64(s))),
        Some(s) => Err(CliError::usage(format!(
            "Error: --timeout must be a positive number of seconds, got {}",
            s
        ))),
    }
}

/// `====== 2 passed, 1 failed in 0.42s ======` over suites.
fn summary_line(outcome: &RunOutcome) -> String {
    let mut parts = Vec::new();
    let passed = outcome.passed_count();
    let failed = outcome.failed_count();
    if passed > 0 {
        parts.push(format!("\x1b[32m{} passed\x1b[0m", passed));
    }
    if failed > 0 {
        parts.push(format!("\x1b[31m{} failed\x1b[0m", failed));
    }
    if parts.is_empty() {
        parts.push("no suites ran".to_string());
    }
    format!(
        "====== {} in {:.2}s ======",
        parts.join(", "),
        outcome.duration.as_secs_f64()
    )
}

// ============================================================================
// check
// ============================================================================

/// Parse each suite and print its test count, or the diagnostic if it does not parse.
pub fn check_suites(suites: &[String], suites_dir: &Path, inputs_dir: &Path) -> CliResult<ExitCode> {
    let source = DirectorySuiteSource::new(suites_dir);
    let schema = OptionSchema::default();
    let mut failed = 0;

    for name in suites {
        match source
            .load(name)
            .and_then(|text| SuiteDefinition::parse(name, &text, inputs_dir, &schema))
        {
            Ok(definition) => println!("{}: {}", name, describe(&definition)),
            Err(e) => {
                failed += 1;
                eprintln!("{}", e.render());
            }
        }
    }

    if failed > 0 {
        return Err(CliError::failure(format!(
            "{} of {} suite(s) failed to parse",
            failed,
            suites.len()
        )));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(definition: &SuiteDefinition) -> String {
    match definition.len() {
        1 => "1 test".to_string(),
        n => format!("{} tests", n),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::suite::SuiteResult;
    use std::fs;

    fn suite(name: &str, passed: bool) -> SuiteResult {
        SuiteResult {
            name: name.to_string(),
            passed,
            tests: Vec::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(None).unwrap(), None);
        assert_eq!(parse_timeout(Some(1.5)).unwrap(), Some(Duration::from_millis(1500)));
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = parse_timeout(Some(bad)).unwrap_err();
            assert_eq!(err.exit_code, ExitCode::USAGE);
        }
    }

    #[test]
    fn test_summary_line() {
        let outcome = RunOutcome {
            suites: vec![suite("a", true), suite("b", true), suite("c", false)],
            duration: Duration::from_millis(420),
        };
        insta::assert_snapshot!(
            log::strip_ansi(&summary_line(&outcome)),
            @"====== 2 passed, 1 failed in 0.42s ======"
        );
    }

    #[test]
    fn test_summary_line_without_suites() {
        let outcome = RunOutcome {
            suites: Vec::new(),
            duration: Duration::ZERO,
        };
        assert_eq!(summary_line(&outcome), "====== no suites ran in 0.00s ======");
    }

    #[test]
    fn test_check_suites_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.toml"), "[test.t1]\ninput = \"a.txt\"\n").unwrap();
        fs::write(dir.path().join("bad.toml"), "[test.t1]\nexpected = \"a.txt\"\n").unwrap();

        let ok = check_suites(&["good".to_string()], dir.path(), Path::new("inputs")).unwrap();
        assert_eq!(ok, ExitCode::SUCCESS);

        let err = check_suites(
            &["good".to_string(), "bad".to_string(), "absent".to_string()],
            dir.path(),
            Path::new("inputs"),
        )
        .unwrap_err();
        assert_eq!(err.message, "2 of 3 suite(s) failed to parse");
    }

    #[test]
    fn test_check_does_not_require_input_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s.toml"), "[test.t1]\ninput = \"missing.txt\"\n").unwrap();
        let code = check_suites(&["s".to_string()], dir.path(), &dir.path().join("inputs")).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
