//! Resolution of suite configuration resources by name.
//!
//! The orchestrator only asks a [`SuiteSource`] for the text of a suite; parsing happens in
//! `suiterun_config`. This keeps the parser free of IO and lets tests serve suites from memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use suiterun_config::ConfigError;

/// Extension of suite files inside a suites directory.
pub const SUITE_EXTENSION: &str = "toml";

pub trait SuiteSource {
    /// Read the configuration text of `suite`.
    fn load(&self, suite: &str) -> Result<String, ConfigError>;
}

/// Suites stored as `<root>/<name>.toml`.
#[derive(Debug, Clone)]
pub struct DirectorySuiteSource {
    root: PathBuf,
}

impl DirectorySuiteSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, suite: &str) -> PathBuf {
        self.root.join(format!("{suite}.{SUITE_EXTENSION}"))
    }
}

impl SuiteSource for DirectorySuiteSource {
    fn load(&self, suite: &str) -> Result<String, ConfigError> {
        let path = self.path_for(suite);
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                suite: suite.to_string(),
                path,
            });
        }
        fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            suite: suite.to_string(),
            path,
            source,
        })
    }
}

/// Suites held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySuiteSource {
    suites: HashMap<String, String>,
}

impl MemorySuiteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suite(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.suites.insert(name.into(), text.into());
    }
}

impl SuiteSource for MemorySuiteSource {
    fn load(&self, suite: &str) -> Result<String, ConfigError> {
        self.suites.get(suite).cloned().ok_or_else(|| ConfigError::NotFound {
            suite: suite.to_string(),
            path: PathBuf::from(format!("<memory>/{suite}.{SUITE_EXTENSION}")),
        })
    }
}
