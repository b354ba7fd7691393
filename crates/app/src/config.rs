use std::path::PathBuf;

use blurmill_core::types::ImageRef;

/// Application configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local demo run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for temporary and saved outputs.
    pub work_root: PathBuf,
    /// Blur passes applied by the demo run.
    pub blur_level: u32,
    /// Source image locator; when unset the demo generates a sample image
    /// under the work root.
    pub source_image: Option<ImageRef>,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var         | Default                  |
    /// |-----------------|--------------------------|
    /// | `BLURMILL_ROOT` | `<system temp>/blurmill` |
    /// | `BLUR_LEVEL`    | `1`                      |
    /// | `SOURCE_IMAGE`  | (generated sample)       |
    pub fn from_env() -> Self {
        let work_root = std::env::var("BLURMILL_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("blurmill"));

        let blur_level: u32 = std::env::var("BLUR_LEVEL")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("BLUR_LEVEL must be a valid u32");

        let source_image = std::env::var("SOURCE_IMAGE").ok().map(ImageRef::new);

        Self {
            work_root,
            blur_level,
            source_image,
        }
    }
}
