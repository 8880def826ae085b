use std::{io, path::PathBuf};

use tempfile::TempDir;

/// Owns every scratch directory made during a run and removes them all when
/// dropped. Removal failures are logged and otherwise ignored.
#[derive(Default)]
pub struct ScratchDirs {
    dirs: Vec<TempDir>,
}

impl ScratchDirs {
    pub fn make_temp_dir(&mut self) -> io::Result<PathBuf> {
        let dir = tempfile::Builder::new().prefix("crashpad-e2e-").tempdir()?;
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), "created scratch directory");
        self.dirs.push(dir);
        Ok(path)
    }
}

impl Drop for ScratchDirs {
    fn drop(&mut self) {
        for dir in self.dirs.drain(..) {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not remove scratch directory"
                );
            }
        }
    }
}
