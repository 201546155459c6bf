//! User-facing log sinks.
//!
//! Every suite and every test case gets its own [`LogSink`]: the same message goes to the
//! console (colored when the terminal allows it) and, once a file is attached, to a plain-text
//! log file next to that entity's results. Sinks are handed to components explicitly; there is
//! no global logger registry.
//!
//! Console format mirrors the file format except for color:
//!
//! ```text
//! t1 [PASS]                      <- Info: message only
//! WARNING: Overwriting 'results' <- Warning/Error/Debug: LEVEL: message
//! ```
//!
//! Internal diagnostics (process spawning, timings) go through `tracing` instead and are
//! controlled with `RUST_LOG`.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

// ANSI styles used in user-facing messages
pub const PASS: &str = "\x1b[92m";
pub const FAIL: &str = "\x1b[91m";
pub const WARNING: &str = "\x1b[93m";
pub const OKBLUE: &str = "\x1b[94m";
pub const BOLD: &str = "\x1b[1m";
pub const UNDERLINE: &str = "\x1b[4m";
pub const RESET: &str = "\x1b[0m";

/// Wrap `text` in an ANSI style. Sinks strip the escapes wherever color is off.
pub fn paint(text: &str, style: &str) -> String {
    format!("{style}{text}{RESET}")
}

/// CSI escape sequences: `ESC [`, numeric parameters, one final letter.
static ANSI_ESCAPE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").ok());

/// Remove ANSI escape sequences such as `ESC [ 92 m` from `text`.
pub fn strip_ansi(text: &str) -> String {
    match ANSI_ESCAPE.as_ref() {
        Some(pattern) => pattern.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    fn style(self) -> &'static str {
        match self {
            Self::Debug => OKBLUE,
            Self::Info => "",
            Self::Warning => WARNING,
            Self::Error => FAIL,
        }
    }
}

/// Where console output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout { color: bool },
    Silent,
}

impl Console {
    /// Stdout, colored only when it is a terminal.
    pub fn detect() -> Self {
        Self::Stdout {
            color: io::stdout().is_terminal(),
        }
    }

    /// Format a line for the console.
    pub fn format(self, severity: Severity, message: &str) -> Option<String> {
        let Self::Stdout { color } = self else {
            return None;
        };
        let line = if severity == Severity::Info {
            message.to_string()
        } else {
            format!("{}: {}", paint(severity.label(), severity.style()), message)
        };
        Some(if color { line } else { strip_ansi(&line) })
    }
}

/// Format a line for a log file: never colored.
pub fn format_file_line(severity: Severity, message: &str) -> String {
    let message = strip_ansi(message);
    if severity == Severity::Info {
        message
    } else {
        format!("{}: {}", severity.label(), message)
    }
}

/// A console sink plus an optional append-only log file.
#[derive(Debug)]
pub struct LogSink {
    console: Console,
    file: Option<(PathBuf, File)>,
}

impl LogSink {
    /// A sink writing only to `console`.
    pub fn new(console: Console) -> Self {
        Self { console, file: None }
    }

    /// A sink writing to `console` and appending to `path`.
    pub fn with_file(console: Console, path: &Path) -> io::Result<Self> {
        let mut sink = Self::new(console);
        sink.attach_file(path)?;
        Ok(sink)
    }

    /// Start appending to `path`, creating it if needed. Replaces any previous file.
    pub fn attach_file(&mut self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.file = Some((path.to_path_buf(), file));
        Ok(())
    }

    pub fn console(&self) -> Console {
        self.console
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn emit(&self, severity: Severity, message: &str) {
        if let Some(line) = self.console.format(severity, message) {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
        if let Some((path, file)) = &self.file {
            let mut file: &File = file;
            if let Err(e) = writeln!(file, "{}", format_file_line(severity, message)) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write log line");
            }
        }
    }

    pub fn debug(&self, message: &str) {
        self.emit(Severity::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Severity::Error, message);
    }
}
