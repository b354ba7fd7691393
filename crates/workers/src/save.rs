//! Persists the final image into the saved-outputs directory.

use std::path::PathBuf;

use blurmill_core::constants::KEY_IMAGE_URI;
use blurmill_core::data::InputData;
use blurmill_core::types::ImageRef;
use blurmill_runtime::{WorkContext, Worker, WorkerError};

use crate::io;

/// Re-encodes the image named by `KEY_IMAGE_URI` into the saved-outputs
/// directory under a timestamped name, and outputs the final locator
/// under the same key.
pub struct SaveWorker {
    root: PathBuf,
}

impl SaveWorker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl Worker for SaveWorker {
    async fn execute(&self, ctx: WorkContext) -> Result<InputData, WorkerError> {
        let locator = ctx
            .input()
            .get_str(KEY_IMAGE_URI)
            .ok_or(WorkerError::MissingInput(KEY_IMAGE_URI))?;
        let source = ImageRef::new(locator).to_path();

        let dir = io::save_output_dir(&self.root);
        std::fs::create_dir_all(&dir)?;
        let dest = dir.join(io::saved_file_name());

        let write_path = dest.clone();
        tokio::task::spawn_blocking(move || -> Result<(), WorkerError> {
            let image = image::open(&source).map_err(|e| WorkerError::Image(e.to_string()))?;
            image
                .save(&write_path)
                .map_err(|e| WorkerError::Image(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| WorkerError::Failed(e.to_string()))??;

        tracing::info!(output = %dest.display(), "Image saved");
        Ok(InputData::builder()
            .put_str(KEY_IMAGE_URI, dest.to_string_lossy())
            .build())
    }
}
