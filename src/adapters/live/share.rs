//! Share adapter: hands an image file to a desktop opener command.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ImageError;
use crate::ports::MediaTarget;

/// Runs `command... <file>` to open the image in the system handler.
pub struct ShareSheet {
    command: Vec<String>,
}

impl ShareSheet {
    /// Create a share target from a program and its leading arguments.
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn handoff_error(&self, message: String) -> ImageError {
        ImageError::Handoff { target: self.name().to_string(), message }
    }
}

impl MediaTarget for ShareSheet {
    fn name(&self) -> &str {
        "share"
    }

    fn deliver(&self, path: &Path) -> Result<PathBuf, ImageError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| self.handoff_error("no share command configured".into()))?;

        tracing::debug!(%program, file = %path.display(), "invoking share command");
        let status = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| self.handoff_error(format!("cannot run '{program}': {e}")))?;

        if status.success() {
            Ok(path.to_path_buf())
        } else {
            Err(self.handoff_error(format!("'{program}' exited with {status}")))
        }
    }
}
