//! Test doubles shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::executor::{ExecError, Invocation, ProcessOutput, ProgramRunner, Termination};

/// A [`ProgramRunner`] backed by a closure that records every invocation.
pub struct FnRunner<F> {
    behaviour: F,
    calls: RefCell<Vec<Invocation>>,
}

impl<F> FnRunner<F>
where
    F: Fn(&Invocation) -> Result<ProcessOutput, ExecError>,
{
    pub fn new(behaviour: F) -> Self {
        Self {
            behaviour,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl<F> ProgramRunner for FnRunner<F>
where
    F: Fn(&Invocation) -> Result<ProcessOutput, ExecError>,
{
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError> {
        self.calls.borrow_mut().push(invocation.clone());
        (self.behaviour)(invocation)
    }
}

/// A clean exit with no captured output.
pub fn exited(code: i32) -> ProcessOutput {
    ProcessOutput {
        stdout: Vec::new(),
        stderr: Vec::new(),
        termination: Termination::Exited(code),
    }
}

/// Write `contents` to the output path (second argument) and exit 0.
pub fn write_output(invocation: &Invocation, contents: &[u8]) -> Result<ProcessOutput, ExecError> {
    let output = PathBuf::from(&invocation.args[1]);
    fs::write(&output, contents).map_err(|source| ExecError::Wait {
        program: invocation.program.clone(),
        source,
    })?;
    Ok(exited(0))
}

/// Create a file that passes the executable precondition.
pub fn make_target(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}
