//! Errors produced while resolving or parsing a suite configuration.
//!
//! Every variant is fatal to the suite it belongs to and harmless to every other suite.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Wide enough that paths in messages are never wrapped.
const RENDER_WIDTH: usize = 200;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Suite configuration file '{}' does not exist", .path.display())]
    #[diagnostic(code(suiterun::config::not_found))]
    NotFound { suite: String, path: PathBuf },

    #[error("Suite configuration file '{}' could not be read: {source}", .path.display())]
    #[diagnostic(code(suiterun::config::unreadable))]
    Unreadable {
        suite: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Suite configuration '{suite}' is not valid TOML: {message}")]
    #[diagnostic(code(suiterun::config::parse))]
    Parse {
        suite: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
    },

    #[error("Suite configuration '{suite}' invalid. Testcase `{test}` defines no input.")]
    #[diagnostic(
        code(suiterun::config::missing_input),
        help("add `input = \"<file>\"` to [test.{test}]")
    )]
    MissingInput { suite: String, test: String },

    #[error("Suite configuration '{suite}' invalid. Testcase name `{test}` {reason}.")]
    #[diagnostic(
        code(suiterun::config::invalid_test_name),
        help("test names become directories under the suite's results; use a plain name such as `t1`")
    )]
    InvalidTestName {
        suite: String,
        test: String,
        reason: &'static str,
    },

    #[error("Suite configuration '{suite}' invalid. Testcase `{test}` must be a table, found {found}.")]
    #[diagnostic(code(suiterun::config::invalid_test))]
    InvalidTestEntry {
        suite: String,
        test: String,
        found: &'static str,
    },

    #[error("Suite configuration '{suite}' invalid. `{key}` in {location} must be {expected}, found {found}.")]
    #[diagnostic(code(suiterun::config::invalid_field))]
    InvalidField {
        suite: String,
        location: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl ConfigError {
    /// Name of the suite this error belongs to.
    pub fn suite(&self) -> &str {
        match self {
            Self::NotFound { suite, .. }
            | Self::Unreadable { suite, .. }
            | Self::Parse { suite, .. }
            | Self::MissingInput { suite, .. }
            | Self::InvalidTestName { suite, .. }
            | Self::InvalidTestEntry { suite, .. }
            | Self::InvalidField { suite, .. } => suite,
        }
    }

    /// Render the error with miette's graphical handler, without colors.
    ///
    /// Parse errors get the offending snippet underlined; every other variant renders as its
    /// message plus help text.
    pub fn render(&self) -> String {
        let handler = miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
            .with_width(RENDER_WIDTH);
        let mut out = String::new();
        if handler.render_report(&mut out, self).is_err() {
            return self.to_string();
        }
        out.trim_end().to_string()
    }
}

/// Human-readable name of a TOML value's type, used in validation messages.
pub(crate) fn type_name(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "a string",
        toml::Value::Integer(_) => "an integer",
        toml::Value::Float(_) => "a float",
        toml::Value::Boolean(_) => "a boolean",
        toml::Value::Datetime(_) => "a datetime",
        toml::Value::Array(_) => "an array",
        toml::Value::Table(_) => "a table",
    }
}
