//! Shared primitive types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque locator for an image resource.
///
/// Carried as a plain string so it can travel through input/output bags
/// unchanged. For file-backed images the locator is the path itself;
/// nothing in the pipeline interprets the string beyond handing it to the
/// worker that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an existing locator string.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Locator for a file on the local filesystem.
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    /// The raw locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the locator as a filesystem path.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}
