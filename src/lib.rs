use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Duration,
};

pub mod cdb;
mod handler;
pub mod locate;
pub mod orchestrator;
pub mod scenario;
pub mod scratch;

pub use cdb::{AssertionFailure, Cdb, CdbRun, Debugger};
pub use orchestrator::Tools;
pub use scratch::ScratchDirs;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not find {0}")]
    ToolNotFound(String),
    #[error("failed to start {}: {source}", tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} exited with {status}", tool.display())]
    ToolFailed { tool: PathBuf, status: ExitStatus },
    #[error("could not initialize report database")]
    DatabaseInit,
    #[error("no completed report found in {}", .0.display())]
    NoCompletedReport(PathBuf),
    #[error("expected exactly one completed report, found {0}")]
    UnexpectedReportCount(usize),
    #[error("invalid pattern for '{label}': {source}")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    #[error(transparent)]
    IO(#[from] io::Error),
}

/// One full run: capture a crash from `crashy_program` and verify the dump
/// with cdb.
pub struct EndToEndTest {
    out_dir: PathBuf,
    cdb_path: Option<PathBuf>,
    pipe_prefix: String,
    handler_grace: Duration,
}

impl EndToEndTest {
    /// `out_dir` is the build directory holding `crashy_program`,
    /// `crashpad_handler` and `crashpad_database_util`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            cdb_path: None,
            pipe_prefix: default_pipe_prefix(),
            handler_grace: Duration::from_millis(250),
        }
    }

    /// Use this debugger instead of searching the usual install locations.
    #[must_use]
    pub fn with_cdb_path(mut self, cdb_path: PathBuf) -> Self {
        self.cdb_path = Some(cdb_path);
        self
    }

    #[must_use]
    pub fn with_pipe_prefix(mut self, pipe_prefix: String) -> Self {
        self.pipe_prefix = pipe_prefix;
        self
    }

    /// How long the handler must stay alive before `crashy_program` starts.
    #[must_use]
    pub fn with_handler_grace(mut self, handler_grace: Duration) -> Self {
        self.handler_grace = handler_grace;
        self
    }

    pub fn run(self) -> Result<(), Error> {
        let cdb_path = match self.cdb_path {
            Some(path) => path,
            None => locate::find_cdb(&locate::search_roots())
                .ok_or_else(|| Error::ToolNotFound("cdb".to_string()))?,
        };
        tracing::info!(cdb = %cdb_path.display(), "using debugger");

        let tools = Tools::in_out_dir(&self.out_dir)?;

        // Dropped at the end of this function on every path, taking the
        // report database with it.
        let mut scratch = ScratchDirs::default();

        let pipe_name = make_pipe_name(&self.pipe_prefix);
        let dump_path = orchestrator::get_dump_from_crashy_program(
            &tools,
            &pipe_name,
            &mut scratch,
            self.handler_grace,
        )?;

        let cdb = Cdb::new(cdb_path, dump_path);
        scenario::run_tests(&cdb, &pipe_name)
    }
}

fn default_pipe_prefix() -> String {
    if cfg!(windows) {
        r"\\.\pipe\end-to-end".to_string()
    } else {
        // No named pipe namespace here, so keep the endpoint in the temp dir
        // like a socket path.
        std::env::temp_dir()
            .join("end-to-end")
            .to_string_lossy()
            .to_string()
    }
}

/// `<prefix>_<pid>_<random u64>`, unique across concurrent runs.
pub fn make_pipe_name(prefix: &str) -> String {
    format!("{}_{}_{}", prefix, std::process::id(), rand::random::<u64>())
}

pub(crate) fn database_arg(database: &Path) -> OsString {
    let mut arg = OsString::from("--database=");
    arg.push(database);
    arg
}

pub(crate) fn exe_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
}
