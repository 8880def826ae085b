use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use regex::Regex;

use crate::Error;

/// Something that can run a single debugger command against a dump and hand
/// back its captured output.
pub trait Debugger {
    fn run(&self, command: &str) -> Result<CdbRun, Error>;
}

/// cdb pointed at one dump file.
pub struct Cdb {
    cdb_path: PathBuf,
    dump_path: PathBuf,
}

impl Cdb {
    pub fn new(cdb_path: PathBuf, dump_path: PathBuf) -> Self {
        Self {
            cdb_path,
            dump_path,
        }
    }
}

impl Debugger for Cdb {
    fn run(&self, command: &str) -> Result<CdbRun, Error> {
        CdbRun::new(&self.cdb_path, &self.dump_path, command)
    }
}

/// Output of one cdb invocation plus a read position.
///
/// `check` searches forward from the position and moves it past each match,
/// so a sequence of checks asserts that their patterns appear in that order.
/// Text behind the position is never searched again.
#[derive(Debug)]
pub struct CdbRun {
    output: String,
    position: usize,
}

impl CdbRun {
    /// Loads the dump, runs `command`, quits, and captures stdout. Blocks
    /// until cdb exits.
    pub fn new(cdb_path: &Path, dump_path: &Path, command: &str) -> Result<Self, Error> {
        tracing::debug!(command, dump = %dump_path.display(), "running cdb");

        let output = Command::new(cdb_path)
            .arg("-z")
            .arg(dump_path)
            .arg("-c")
            .arg(format!("{};q", command))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| Error::Spawn {
                tool: cdb_path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: cdb_path.to_path_buf(),
                status: output.status,
            });
        }

        Ok(Self::from_output(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    pub fn from_output(output: String) -> Self {
        Self {
            output,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Output not yet consumed by a successful check.
    pub fn remaining(&self) -> &str {
        &self.output[self.position..]
    }

    pub fn check(&mut self, pattern: &str, label: &str) -> Result<(), Error> {
        let regex = Regex::new(pattern).map_err(|source| Error::Pattern {
            label: label.to_string(),
            source,
        })?;

        match regex.find(self.remaining()) {
            Some(found) => {
                self.position += found.end();
                tracing::debug!(label, position = self.position, "matched");
                println!("ok - {}", label);
                Ok(())
            }
            None => Err(AssertionFailure {
                label: label.to_string(),
                pattern: pattern.to_string(),
                remaining: self.remaining().to_string(),
            }
            .into()),
        }
    }
}

/// A pattern that did not appear in what was left of the output.
#[derive(Debug)]
pub struct AssertionFailure {
    pub label: String,
    pub pattern: String,
    pub remaining: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        writeln!(f, "{}", rule)?;
        writeln!(f, "FAILED - {}", self.label)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "did not match:\n  {}", self.pattern)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "remaining output was:\n  {}", self.remaining)?;
        write!(f, "{}", rule)
    }
}

impl std::error::Error for AssertionFailure {}
