//! Deletes stale temporary files left by earlier blur runs.

use std::path::PathBuf;

use blurmill_core::constants::TEMP_FILE_SUFFIX;
use blurmill_core::data::InputData;
use blurmill_runtime::{WorkContext, Worker, WorkerError};

use crate::io;

/// Removes every `.png` directly inside the temp output directory.
///
/// An absent directory is a success: there is nothing to clean. Files
/// without the temp suffix are left untouched. Any I/O error fails the
/// unit, which aborts the rest of the chain.
pub struct CleanupWorker {
    root: PathBuf,
}

impl CleanupWorker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl Worker for CleanupWorker {
    async fn execute(&self, _ctx: WorkContext) -> Result<InputData, WorkerError> {
        let dir = io::temp_output_dir(&self.root);
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "Temp directory absent, nothing to clean");
            return Ok(InputData::default());
        }

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(TEMP_FILE_SUFFIX) {
                std::fs::remove_file(entry.path())?;
                tracing::info!(file = %name, "Deleted temporary file");
            }
        }

        Ok(InputData::default())
    }
}
