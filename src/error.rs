//! Unified error type for imagegen.

use thiserror::Error;

/// Errors that can occur while generating, saving or sharing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// A required form field (prompt, model, aspect ratio) is empty.
    #[error("{0}")]
    Validation(String),

    /// A value is not part of the catalog or is otherwise malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The inference endpoint returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Handing a file to the media library or share target failed.
    #[error("{target} failed: {message}")]
    Handoff {
        /// Name of the target (e.g. `"media library"`).
        target: String,
        /// What went wrong.
        message: String,
    },

    /// A data URI could not be built or parsed.
    #[error("Data URI error: {0}")]
    DataUri(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// No API token configured for the inference endpoint.
    #[error("No API token for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },

    /// Save or share was requested before any image was generated.
    #[error("No image has been generated yet")]
    NoImage,

    /// A newer generation was started while this one was in flight.
    #[error("Generation superseded by a newer request")]
    Superseded,
}
