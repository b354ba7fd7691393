//! Applies one gaussian blur pass to the input image.

use std::path::PathBuf;

use blurmill_core::constants::KEY_IMAGE_URI;
use blurmill_core::data::InputData;
use blurmill_core::types::ImageRef;
use blurmill_runtime::{WorkContext, Worker, WorkerError};

use crate::io;

/// Blur strength of a single pass. Higher blur levels are produced by
/// chaining passes, not by raising the sigma.
const BLUR_SIGMA: f32 = 3.0;

/// Reads the image named by `KEY_IMAGE_URI`, blurs it once, and writes
/// the result as a fresh temp file whose locator becomes this unit's
/// output under the same key.
pub struct BlurWorker {
    root: PathBuf,
}

impl BlurWorker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl Worker for BlurWorker {
    async fn execute(&self, ctx: WorkContext) -> Result<InputData, WorkerError> {
        let locator = ctx
            .input()
            .get_str(KEY_IMAGE_URI)
            .ok_or(WorkerError::MissingInput(KEY_IMAGE_URI))?;
        let source = ImageRef::new(locator).to_path();

        let dir = io::temp_output_dir(&self.root);
        std::fs::create_dir_all(&dir)?;
        let dest = dir.join(io::temp_file_name());

        let write_path = dest.clone();
        tokio::task::spawn_blocking(move || -> Result<(), WorkerError> {
            let image = image::open(&source).map_err(|e| WorkerError::Image(e.to_string()))?;
            let blurred = image.blur(BLUR_SIGMA);
            blurred
                .save(&write_path)
                .map_err(|e| WorkerError::Image(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| WorkerError::Failed(e.to_string()))??;

        tracing::info!(output = %dest.display(), "Blur pass written");
        Ok(InputData::builder()
            .put_str(KEY_IMAGE_URI, dest.to_string_lossy())
            .build())
    }
}
