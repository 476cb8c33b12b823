//! Media target port: where a materialized image file is handed off to.

use std::path::{Path, PathBuf};

use crate::error::ImageError;

/// Receives a finished image file (media library, share sheet, ...).
pub trait MediaTarget: Send + Sync {
    /// Short human-facing name used in logs and errors.
    fn name(&self) -> &str;

    /// Hand the file at `path` to the target.
    ///
    /// Returns the path the target now holds the image under.
    ///
    /// # Errors
    ///
    /// Returns an error if the target rejects or cannot receive the file.
    fn deliver(&self, path: &Path) -> Result<PathBuf, ImageError>;
}
