//! Suite and test definitions, and the parser that builds them from TOML text.
//!
//! ```toml
//! [options]
//! option = true
//! parameter = "value"
//!
//! [test.t1]
//! input = "a.txt"
//! expected = "a.expected"   # optional, byte-exact comparison
//!
//! [test.t1.options]         # optional, overrides [options] per key
//! parameter = "other"
//! ```

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use miette::NamedSource;
use serde::Deserialize;

use crate::error::{ConfigError, type_name};
use crate::options::OptionSchema;

/// Extension given to the file the target program writes for each test.
pub const OUTPUT_EXTENSION: &str = "out";

/// Output file name for an input: same stem, [`OUTPUT_EXTENSION`] extension.
///
/// `inputs/a.txt` becomes `a.out`; the result is a bare file name meant to be joined onto the
/// scratch directory.
pub fn derive_output_name(input: &Path) -> PathBuf {
    let mut name = match input.file_stem() {
        Some(stem) => stem.to_os_string(),
        None => OsString::from("output"),
    };
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

/// Whether `name` is usable as a single directory or file name.
///
/// Exactly one normal path component: no separators, no `.` or `..`, no root or prefix, not empty.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// One scenario: an input file run through the target with a fixed set of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    pub name: String,
    /// Input path, already joined onto the inputs root.
    pub input: PathBuf,
    /// Output file name relative to the scratch directory.
    pub output: PathBuf,
    /// Expected output, already joined onto the inputs root.
    pub expected: Option<PathBuf>,
    /// Effective option tokens: suite options with this test's overrides applied.
    pub options: Vec<String>,
}

/// A named group of tests sharing invocation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteDefinition {
    name: String,
    options: Vec<String>,
    tests: Vec<TestDefinition>,
}

#[derive(Deserialize)]
struct RawSuite {
    #[serde(default)]
    options: toml::Table,
    #[serde(default)]
    test: toml::Table,
}

impl SuiteDefinition {
    /// Parse a suite file's text.
    ///
    /// Only the presence and type of fields are checked; whether `input` files exist is left
    /// to the caller. Any invalid test entry aborts the whole suite: no partial test list is
    /// ever returned.
    pub fn parse(name: &str, text: &str, inputs_root: &Path, schema: &OptionSchema) -> Result<Self, ConfigError> {
        let raw: RawSuite = toml::from_str(text).map_err(|e| ConfigError::Parse {
            suite: name.to_string(),
            message: e.message().to_string(),
            src: NamedSource::new(format!("{name}.toml"), text.to_string()),
            span: e.span().map(Into::into),
        })?;

        schema.validate(name, "[options]", &raw.options)?;
        let options = schema.tokens(&raw.options);

        let mut tests = Vec::with_capacity(raw.test.len());
        for (test_name, entry) in &raw.test {
            tests.push(parse_test(name, test_name, entry, &raw.options, inputs_root, schema)?);
        }

        Ok(Self {
            name: name.to_string(),
            options,
            tests,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option tokens shared by every test, before per-test overrides.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Tests in declaration order.
    pub fn tests(&self) -> &[TestDefinition] {
        &self.tests
    }

    pub fn test(&self, name: &str) -> Option<&TestDefinition> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

fn parse_test(
    suite: &str,
    test: &str,
    entry: &toml::Value,
    suite_options: &toml::Table,
    inputs_root: &Path,
    schema: &OptionSchema,
) -> Result<TestDefinition, ConfigError> {
    let invalid_name = |reason| ConfigError::InvalidTestName {
        suite: suite.to_string(),
        test: test.to_string(),
        reason,
    };
    if !is_plain_name(test) {
        return Err(invalid_name("must be a single plain path component"));
    }
    // The suite log sits next to the test directories.
    if test == format!("{suite}.log") {
        return Err(invalid_name("is reserved for the suite log"));
    }

    let location = format!("[test.{test}]");
    let Some(entry) = entry.as_table() else {
        return Err(ConfigError::InvalidTestEntry {
            suite: suite.to_string(),
            test: test.to_string(),
            found: type_name(entry),
        });
    };

    let input = match entry.get("input") {
        None => {
            return Err(ConfigError::MissingInput {
                suite: suite.to_string(),
                test: test.to_string(),
            });
        }
        Some(value) => string_field(suite, &location, "input", value)?,
    };
    let expected = entry
        .get("expected")
        .map(|value| string_field(suite, &location, "expected", value))
        .transpose()?;

    let options = match entry.get("options") {
        None => schema.tokens(suite_options),
        Some(toml::Value::Table(overrides)) => {
            schema.validate(suite, &format!("[test.{test}.options]"), overrides)?;
            let mut merged = suite_options.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            schema.tokens(&merged)
        }
        Some(other) => {
            return Err(ConfigError::InvalidField {
                suite: suite.to_string(),
                location,
                key: "options".to_string(),
                expected: "a table",
                found: type_name(other),
            });
        }
    };

    let input = inputs_root.join(input);
    let output = derive_output_name(&input);
    Ok(TestDefinition {
        name: test.to_string(),
        input,
        output,
        expected: expected.map(|e| inputs_root.join(e)),
        options,
    })
}

fn string_field<'a>(suite: &str, location: &str, key: &str, value: &'a toml::Value) -> Result<&'a str, ConfigError> {
    value.as_str().ok_or_else(|| ConfigError::InvalidField {
        suite: suite.to_string(),
        location: location.to_string(),
        key: key.to_string(),
        expected: "a string",
        found: type_name(value),
    })
}
