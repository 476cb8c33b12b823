//! File naming and image materialization.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::data_uri::EncodedImage;
use crate::error::ImageError;

/// Extension of every materialized file.
const EXTENSION: &str = "jpeg";

/// Build the `YYYYMMDDHHMMSS` file stem for a moment in time.
#[must_use]
pub fn timestamp_stem(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// First free `<stem>.jpeg`, `<stem>-1.jpeg`, ... path inside `dir`.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.{EXTENSION}"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.{EXTENSION}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Decode an encoded image and write its bytes to a timestamp-named file in
/// `dir`. The payload is written verbatim whatever its MIME type.
///
/// # Errors
///
/// Returns an error if the payload cannot be decoded, the directory cannot be
/// created, or the file cannot be written.
pub fn materialize(image: &EncodedImage, dir: &Path) -> Result<PathBuf, ImageError> {
    let data = image.decode()?;
    std::fs::create_dir_all(dir)?;
    let path = unique_path(dir, &timestamp_stem(&Local::now()));
    std::fs::write(&path, &data)?;
    tracing::debug!(
        path = %path.display(),
        mime = image.mime_type(),
        bytes = data.len(),
        "materialized image"
    );
    Ok(path)
}
