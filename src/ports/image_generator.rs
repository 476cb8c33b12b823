//! Image generator port for text-to-image inference endpoints.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::dimensions::ImageDimensions;
use crate::error::ImageError;

/// What goes over the wire for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Backend model id (e.g. `"black-forest-labs/FLUX.1-dev"`).
    pub model: String,
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Target pixel dimensions.
    pub dimensions: ImageDimensions,
}

impl InferenceRequest {
    /// JSON body expected by the inference endpoint.
    #[must_use]
    pub fn body(&self) -> InferenceBody<'_> {
        InferenceBody {
            inputs: &self.prompt,
            parameters: InferenceParameters {
                width: self.dimensions.width,
                height: self.dimensions.height,
            },
        }
    }
}

/// Serialized request body: `{"inputs": ..., "parameters": {"width": .., "height": ..}}`.
#[derive(Debug, Serialize)]
pub struct InferenceBody<'a> {
    /// The prompt.
    pub inputs: &'a str,
    /// Generation parameters.
    pub parameters: InferenceParameters,
}

/// Generation parameters sent alongside the prompt.
#[derive(Debug, Serialize)]
pub struct InferenceParameters {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A single generated image as returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/jpeg"`).
    pub mime_type: String,
}

/// Boxed future type returned by [`ImageGenerator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GeneratedImage, ImageError>> + Send + 'a>>;

/// Generates images from text prompts via an external API.
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for the given request.
    fn generate(&self, request: &InferenceRequest) -> GenerateFuture<'_>;
}
