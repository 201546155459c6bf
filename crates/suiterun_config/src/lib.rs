//! Parse suite configuration files into immutable suite and test definitions.
//!
//! This crate is the pure half of suite loading: it turns the text of a suite file into a
//! [`SuiteDefinition`] without touching the filesystem or spawning anything. Resolving the
//! file by name, checking that inputs exist and preparing directories all live in the
//! `suiterun` crate.
//!
//! ## Notes
//!
//! - **No IO**: paths are only joined, never inspected.
//! - Option handling is driven by an explicit [`OptionSchema`]; a value whose type does not
//!   match its field is rejected here rather than passed to the target program.

pub mod error;
pub mod options;
pub mod suite;

pub use error::ConfigError;
pub use options::{OptionField, OptionKind, OptionSchema};
pub use suite::{OUTPUT_EXTENSION, SuiteDefinition, TestDefinition, derive_output_name, is_plain_name};
