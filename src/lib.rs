#![forbid(unsafe_code)]
//! Declarative suite runner for external programs
//!
//! A suite is a TOML file naming test cases (input file plus options). For every test the
//! harness invokes the program under test as `program <input> <output> [options...]`, decides
//! pass/fail from its exit status, and leaves a per-suite, per-test results tree with logs and
//! captured streams.
//!
//! ## Layers
//!
//! - `suiterun_config` - Pure suite parsing and the option schema (no IO)
//! - [`workspace`] - Results and scratch directory management
//! - [`executor`] - One test case: invocation, classification, artifacts
//! - [`suite`] - One suite: configuration, ordered execution, status
//! - [`controller`] - A whole run over many suites
//! - [`cli`] - The `suiterun` command line
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli`, `executor`, `suite`
//!   and `controller` modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod controller;
pub mod executor;
pub mod log;
pub mod report;
pub mod source;
pub mod suite;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use controller::{HarnessError, HarnessSettings, RunController, RunOutcome};
pub use executor::{ProgramRunner, RunResult, SubprocessRunner, TestCaseExecutor};
pub use source::{DirectorySuiteSource, MemorySuiteSource, SuiteSource};
pub use suite::{SuiteOrchestrator, SuiteResult};
pub use suiterun_config::{ConfigError, OptionSchema, SuiteDefinition, TestDefinition};
