use std::{
    path::{Path, PathBuf},
    process::{Child, Command},
    time::Duration,
};

use crate::{database_arg, Error};

/// A running `crashpad_handler`. The process is killed when this is dropped,
/// whichever way the caller leaves.
pub(crate) struct HandlerProcess {
    child: Child,
    path: PathBuf,
}

impl HandlerProcess {
    pub fn spawn(handler: &Path, pipe_name: &str, database: &Path) -> Result<Self, Error> {
        tracing::info!(pipe_name, "starting crash handler");

        let child = Command::new(handler)
            .arg(format!("--pipe-name={}", pipe_name))
            .arg(database_arg(database))
            .spawn()
            .map_err(|source| Error::Spawn {
                tool: handler.to_path_buf(),
                source,
            })?;

        Ok(Self {
            child,
            path: handler.to_path_buf(),
        })
    }

    /// Waits out `grace`, failing if the handler exits in the meantime. There
    /// is no readiness signal from the handler, so this only catches a
    /// handler that dies on startup.
    pub fn wait_ready(&mut self, grace: Duration) -> Result<(), Error> {
        let poll = Duration::from_millis(50);
        let mut waited = Duration::ZERO;

        loop {
            let exited = self.child.try_wait().map_err(|source| Error::Spawn {
                tool: self.path.clone(),
                source,
            })?;
            if let Some(status) = exited {
                return Err(Error::ToolFailed {
                    tool: self.path.clone(),
                    status,
                });
            }
            if waited >= grace {
                return Ok(());
            }
            std::thread::sleep(poll);
            waited += poll;
        }
    }
}

impl Drop for HandlerProcess {
    fn drop(&mut self) {
        tracing::debug!(pid = self.child.id(), "stopping crash handler");
        // Fails if the handler already exited, which is fine.
        self.child.kill().ok();
        self.child.wait().ok();
    }
}
