//! Service context that bundles all port trait objects.

use std::sync::Arc;

use crate::adapters::live::inference::InferenceGenerator;
use crate::adapters::live::library::MediaLibrary;
use crate::adapters::live::share::ShareSheet;
use crate::config::{Settings, TOKEN_ENV};
use crate::error::ImageError;
use crate::ports::{ImageGenerator, MediaTarget};

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Arc<dyn ImageGenerator>,
    /// Where `save` puts images.
    pub library: Arc<dyn MediaTarget>,
    /// Where `share` sends images.
    pub share: Arc<dyn MediaTarget>,
}

impl ServiceContext {
    /// Create a live context from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no API token is configured.
    pub fn live(settings: &Settings) -> Result<Self, ImageError> {
        let token = settings.token.clone().ok_or_else(|| ImageError::MissingApiKey {
            provider: "the inference endpoint".into(),
            env_var: TOKEN_ENV.into(),
        })?;
        if !settings.base_url.ends_with('/') {
            tracing::warn!(base_url = %settings.base_url, "base URL has no trailing '/'; model id is appended as-is");
        }

        Ok(Self {
            generator: Arc::new(InferenceGenerator::new(settings.base_url.clone(), token)),
            library: Arc::new(MediaLibrary::new(settings.library_dir.clone())),
            share: Arc::new(ShareSheet::new(settings.share_command.clone())),
        })
    }
}
