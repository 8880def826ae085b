use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use crashpad_end_to_end::EndToEndTest;
use tracing_subscriber::EnvFilter;

/// Crash crashy_program under crashpad_handler and check the resulting dump
/// with cdb.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Build output directory containing crashy_program, crashpad_handler
    /// and crashpad_database_util
    out_dir: PathBuf,

    /// Path to cdb, skipping the search of the usual install locations
    #[arg(long)]
    cdb: Option<PathBuf>,

    /// Milliseconds the handler must stay up before crashy_program starts
    #[arg(long, default_value_t = 250)]
    handler_grace_ms: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not errors.
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            e.print().ok();
            return code;
        }
    };

    let mut test = EndToEndTest::new(cli.out_dir)
        .with_handler_grace(Duration::from_millis(cli.handler_grace_ms));
    if let Some(cdb) = cli.cdb {
        test = test.with_cdb_path(cdb);
    }

    match test.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
