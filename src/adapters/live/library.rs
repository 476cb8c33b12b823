//! Media library adapter: keeps a persistent copy of saved images.

use std::path::{Path, PathBuf};

use crate::error::ImageError;
use crate::ports::MediaTarget;

/// A directory acting as the user's photo library.
pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    /// Create a library rooted at `dir` (created on first save).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn handoff_error(&self, message: String) -> ImageError {
        ImageError::Handoff { target: self.name().to_string(), message }
    }
}

impl MediaTarget for MediaLibrary {
    fn name(&self) -> &str {
        "media library"
    }

    fn deliver(&self, path: &Path) -> Result<PathBuf, ImageError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| self.handoff_error(format!("{} has no file name", path.display())))?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            self.handoff_error(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let destination = self.dir.join(file_name);
        std::fs::copy(path, &destination).map_err(|e| {
            self.handoff_error(format!(
                "cannot copy {} to {}: {e}",
                path.display(),
                destination.display()
            ))
        })?;
        Ok(destination)
    }
}
