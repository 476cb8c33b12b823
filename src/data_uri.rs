//! Self-describing `data:` URI encoding of image payloads.

use base64::Engine;

use crate::error::ImageError;

/// A validated `data:<mime>;base64,<payload>` string holding one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    uri: String,
    /// Byte offset of the payload (just past the comma).
    payload_start: usize,
}

impl EncodedImage {
    /// Encode raw image bytes with the given MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error if `mime_type` is not an `image/*` type.
    pub fn encode(data: &[u8], mime_type: &str) -> Result<Self, ImageError> {
        if !mime_type.starts_with("image/") {
            return Err(ImageError::DataUri(format!("'{mime_type}' is not an image type")));
        }
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        let prefix = format!("data:{mime_type};base64,");
        let payload_start = prefix.len();
        Ok(Self { uri: prefix + &payload, payload_start })
    }

    /// MIME type from the URI metadata, e.g. `image/jpeg`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        // "data:" .. ";base64,"
        &self.uri["data:".len()..self.payload_start - ";base64,".len()]
    }

    /// The base64 payload with the metadata prefix split off.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.uri[self.payload_start..]
    }

    /// Decode the payload back to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload())
            .map_err(|e| ImageError::DataUri(format!("Failed to decode payload: {e}")))
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}
