//! Live adapter for hosted text-to-image inference endpoints.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ImageError;
use crate::ports::image_generator::{
    GenerateFuture, GeneratedImage, ImageGenerator, InferenceRequest,
};

/// MIME type assumed when neither the header nor the bytes tell us.
const FALLBACK_MIME: &str = "image/jpeg";

/// Live generator that POSTs to `{base_url}{model}` with a bearer token.
pub struct InferenceGenerator {
    client: Client,
    base_url: String,
    token: String,
}

impl InferenceGenerator {
    /// Create a generator for the given endpoint base URL and API token.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into(), token: token.into() }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}{model}", self.base_url)
    }
}

impl ImageGenerator for InferenceGenerator {
    fn generate(&self, request: &InferenceRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = self.model_url(&request.model);
            tracing::debug!(%url, dimensions = %request.dimensions, "sending inference request");

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&request.body())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await?;
                return Err(ImageError::Api {
                    status: status.as_u16(),
                    message: error_message(&text),
                });
            }

            let header_mime = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
            let data = response.bytes().await?.to_vec();

            if data.is_empty() {
                return Err(ImageError::Api {
                    status: status.as_u16(),
                    message: "Empty image payload".into(),
                });
            }

            let mime_type = resolve_mime(header_mime.as_deref(), &data);
            tracing::debug!(bytes = data.len(), %mime_type, "received image payload");
            Ok(GeneratedImage { data, mime_type })
        })
    }
}

// --- Inference API error body ---

#[derive(Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

/// Pull the `error` field out of a failure body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error: serde_json::Value::String(message) }) => message,
        Ok(ErrorBody { error }) => error.to_string(),
        Err(_) if body.len() > 500 => {
            let cut = (0..=500).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
            format!("{}...", &body[..cut])
        }
        Err(_) => body.to_string(),
    }
}

/// Prefer an `image/*` Content-Type, else sniff the bytes.
fn resolve_mime(header: Option<&str>, data: &[u8]) -> String {
    if let Some(mime) = header.filter(|m| m.starts_with("image/")) {
        return mime.to_string();
    }
    image::guess_format(data)
        .map_or_else(|_| FALLBACK_MIME.to_string(), |f| f.to_mime_type().to_string())
}
