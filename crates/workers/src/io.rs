//! Shared filesystem helpers for the built-in workers.

use std::path::{Path, PathBuf};

use blurmill_core::constants::{SAVE_OUTPUT_DIR, TEMP_OUTPUT_DIR};
use chrono::Utc;
use uuid::Uuid;

/// Directory holding intermediate blur outputs under `root`.
pub fn temp_output_dir(root: &Path) -> PathBuf {
    root.join(TEMP_OUTPUT_DIR)
}

/// Directory holding saved final images under `root`.
pub fn save_output_dir(root: &Path) -> PathBuf {
    root.join(SAVE_OUTPUT_DIR)
}

/// Fresh name for an intermediate blur output.
pub(crate) fn temp_file_name() -> String {
    format!("blur-filter-output-{}.png", Uuid::new_v4())
}

/// Timestamped name for a saved final image.
pub(crate) fn saved_file_name() -> String {
    format!(
        "blurred-{}-{}.png",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}
