use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use crate::{database_arg, exe_path, handler::HandlerProcess, scratch::ScratchDirs, Error};

/// The crashpad executables from a build output directory.
#[derive(Debug, Clone)]
pub struct Tools {
    pub crashy_program: PathBuf,
    pub handler: PathBuf,
    pub database_util: PathBuf,
}

impl Tools {
    pub fn in_out_dir(out_dir: &Path) -> Result<Self, Error> {
        let find = |name: &str| {
            let path = exe_path(out_dir, name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(Error::ToolNotFound(path.display().to_string()))
            }
        };

        Ok(Self {
            crashy_program: find("crashy_program")?,
            handler: find("crashpad_handler")?,
            database_util: find("crashpad_database_util")?,
        })
    }
}

/// Sets up a fresh report database, runs `crashy_program` against a handler
/// listening on `pipe_name`, and returns the path of the dump it left behind.
///
/// The handler is stopped before this returns, on success or failure.
pub fn get_dump_from_crashy_program(
    tools: &Tools,
    pipe_name: &str,
    scratch: &mut ScratchDirs,
    handler_grace: Duration,
) -> Result<PathBuf, Error> {
    let database = scratch.make_temp_dir()?;

    let status = Command::new(&tools.database_util)
        .arg("--create")
        .arg(database_arg(&database))
        .status()
        .map_err(|source| Error::Spawn {
            tool: tools.database_util.clone(),
            source,
        })?;
    if !status.success() {
        tracing::warn!(%status, "database initialization failed");
        return Err(Error::DatabaseInit);
    }

    let mut handler = HandlerProcess::spawn(&tools.handler, pipe_name, &database)?;
    handler.wait_ready(handler_grace)?;

    let status = Command::new(&tools.crashy_program)
        .arg(pipe_name)
        .status()
        .map_err(|source| Error::Spawn {
            tool: tools.crashy_program.clone(),
            source,
        })?;
    // It is supposed to crash, so a failing status is the normal case.
    tracing::info!(%status, "crashy_program exited");

    let output = Command::new(&tools.database_util)
        .arg(database_arg(&database))
        .arg("--show-completed-reports")
        .arg("--show-all-report-info")
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| Error::Spawn {
            tool: tools.database_util.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: tools.database_util.clone(),
            status: output.status,
        });
    }

    let mut paths = parse_report_paths(&String::from_utf8_lossy(&output.stdout));
    match paths.len() {
        0 => Err(Error::NoCompletedReport(database)),
        1 => Ok(paths.remove(0)),
        n => Err(Error::UnexpectedReportCount(n)),
    }
}

/// Pulls the value of every `Path:` line out of the database utility's
/// report listing.
pub fn parse_report_paths(listing: &str) -> Vec<PathBuf> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Path:"))
        .filter_map(|line| line.split_once(':'))
        .map(|(_, value)| PathBuf::from(value.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_field() {
        let listing = "1: 9c2d5c6e-3e64-4d1b-9f3a-4a1f2b0e7c11\n\
            \x20 Path: C:\\tmp\\db\\reports\\9c2d5c6e.dmp\n\
            \x20 Remote ID:\n\
            \x20 Uploaded: false\n";
        assert_eq!(
            parse_report_paths(listing),
            vec![PathBuf::from(r"C:\tmp\db\reports\9c2d5c6e.dmp")]
        );
    }

    #[test]
    fn keeps_colons_in_value() {
        assert_eq!(
            parse_report_paths("Path:   C:\\a.dmp  \n"),
            vec![PathBuf::from(r"C:\a.dmp")]
        );
    }

    #[test]
    fn ignores_other_fields() {
        assert!(parse_report_paths("Completed reports:\n  Uploaded: false\n  PathX\n").is_empty());
    }

    #[test]
    fn missing_tools_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        match Tools::in_out_dir(dir.path()) {
            Err(Error::ToolNotFound(name)) => assert!(name.contains("crashy_program")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
