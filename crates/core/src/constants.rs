//! Well-known names, tags, and data keys shared across the pipeline.
//!
//! These must match between the chain builder, the built-in workers, and
//! any observer watching the output tag.

/// Input/output data key carrying the image locator.
pub const KEY_IMAGE_URI: &str = "KEY_IMAGE_URI";

/// Tag applied to the final save unit so its status can be observed.
pub const TAG_OUTPUT: &str = "OUTPUT";

/// Unique name under which the image manipulation chain is enqueued.
///
/// At most one non-terminal chain may exist under this name; enqueueing
/// a new one with the replace policy evicts the prior chain.
pub const IMAGE_MANIPULATION_WORK_NAME: &str = "image_manipulation_work";

/// Subdirectory (under the work root) holding intermediate blur outputs.
pub const TEMP_OUTPUT_DIR: &str = "blur_filter_outputs";

/// Subdirectory (under the work root) holding saved final images.
pub const SAVE_OUTPUT_DIR: &str = "blur_saved_outputs";

/// File suffix targeted by the cleanup worker.
pub const TEMP_FILE_SUFFIX: &str = ".png";
