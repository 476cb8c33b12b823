//! The generation session: form state, one-at-a-time generation and the
//! current result.
//!
//! A session moves `Idle -> Pending -> Settled`. Every `generate` call takes
//! a fresh sequence token; only the newest token may publish a result or
//! settle the session, so overlapping calls resolve as "newest request wins".

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog;
use crate::context::ServiceContext;
use crate::data_uri::EncodedImage;
use crate::dimensions::{image_dimensions, ImageDimensions, DEFAULT_BASE_SIZE};
use crate::error::ImageError;
use crate::output::materialize;
use crate::ports::{ImageGenerator, InferenceRequest, MediaTarget};

/// Text the user filled in, snapshotted when "generate" is invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Prompt text.
    pub prompt: String,
    /// Model label or backend id.
    pub model: String,
    /// Aspect-ratio label (`16:9`) or value (`16/9`).
    pub aspect_ratio: String,
}

impl GenerationRequest {
    /// Build a request from the three form fields.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        aspect_ratio: impl Into<String>,
    ) -> Self {
        Self { prompt: prompt.into(), model: model.into(), aspect_ratio: aspect_ratio.into() }
    }

    /// Check that no field is blank.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Validation`] if any field is empty.
    pub fn validate(&self) -> Result<(), ImageError> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.prompt) || blank(&self.model) || blank(&self.aspect_ratio) {
            return Err(ImageError::Validation("Please fill in all fields".into()));
        }
        Ok(())
    }
}

/// A successfully generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// The image as a data URI.
    pub image: EncodedImage,
    /// Dimensions that were requested.
    pub dimensions: ImageDimensions,
    /// Backend model id that produced it.
    pub model: String,
}

/// How the last generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An image was published.
    Success,
    /// The request failed; the previous image (if any) is still current.
    Failure,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing generated yet.
    Idle,
    /// A generation is in flight.
    Pending,
    /// The newest generation finished.
    Settled(Outcome),
}

#[derive(Debug)]
struct State {
    form: GenerationRequest,
    phase: Phase,
    latest: u64,
    current: Option<Arc<GenerationResult>>,
}

/// One screen's worth of generation state plus the services it talks to.
pub struct GenerationSession {
    generator: Arc<dyn ImageGenerator>,
    library: Arc<dyn MediaTarget>,
    share: Arc<dyn MediaTarget>,
    documents_dir: PathBuf,
    base_size: u32,
    state: Mutex<State>,
}

impl GenerationSession {
    /// Create an idle session. Materialized files go to `documents_dir`.
    pub fn new(ctx: ServiceContext, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator: ctx.generator,
            library: ctx.library,
            share: ctx.share,
            documents_dir: documents_dir.into(),
            base_size: DEFAULT_BASE_SIZE,
            state: Mutex::new(State {
                form: GenerationRequest::default(),
                phase: Phase::Idle,
                latest: 0,
                current: None,
            }),
        }
    }

    /// Override the base size used for the dimension calculation.
    #[must_use]
    pub fn with_base_size(mut self, base_size: u32) -> Self {
        self.base_size = base_size;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("session state lock poisoned")
    }

    /// Set the prompt field.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().form.prompt = prompt.into();
    }

    /// Set the model field.
    pub fn set_model(&self, model: impl Into<String>) {
        self.lock().form.model = model.into();
    }

    /// Set the aspect-ratio field.
    pub fn set_aspect_ratio(&self, aspect_ratio: impl Into<String>) {
        self.lock().form.aspect_ratio = aspect_ratio.into();
    }

    /// Replace the prompt with a random example and return it.
    pub fn suggest_prompt(&self) -> &'static str {
        let prompt = catalog::suggest_prompt();
        self.set_prompt(prompt);
        prompt
    }

    /// Snapshot of the current form.
    #[must_use]
    pub fn request(&self) -> GenerationRequest {
        self.lock().form.clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Whether the loading indicator should be shown.
    #[must_use]
    #[allow(dead_code)]
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Pending
    }

    /// The image currently on display, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<GenerationResult>> {
        self.lock().current.clone()
    }

    /// Generate an image for `request` and make it the current result.
    ///
    /// # Errors
    ///
    /// - [`ImageError::Validation`] / [`ImageError::InvalidArgument`] before
    ///   anything is sent; the session does not change phase.
    /// - Any endpoint or encoding error; the session settles as failed and
    ///   keeps its previous image.
    /// - [`ImageError::Superseded`] if a newer call started meanwhile; this
    ///   call's image is discarded.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Arc<GenerationResult>, ImageError> {
        if let Err(e) = request.validate() {
            tracing::warn!("{e}");
            return Err(e);
        }
        let model = catalog::resolve_model(&request.model).map_err(ImageError::InvalidArgument)?;
        let ratio = catalog::resolve_aspect_ratio(&request.aspect_ratio)
            .map_err(ImageError::InvalidArgument)?;
        let dimensions =
            image_dimensions(ratio, self.base_size).map_err(ImageError::InvalidArgument)?;

        let seq = self.begin();
        tracing::info!(seq, model, %dimensions, "generating image");

        let inference = InferenceRequest {
            model: model.to_string(),
            prompt: request.prompt.trim().to_string(),
            dimensions,
        };
        match self.run(&inference).await {
            Ok(image) => self.publish(
                seq,
                GenerationResult { image, dimensions, model: inference.model },
            ),
            Err(e) => Err(self.fail(seq, e)),
        }
    }

    /// Generate from the session's own form.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationSession::generate`].
    pub async fn generate_from_form(&self) -> Result<Arc<GenerationResult>, ImageError> {
        let request = self.request();
        self.generate(&request).await
    }

    fn begin(&self) -> u64 {
        let mut state = self.lock();
        state.latest += 1;
        state.phase = Phase::Pending;
        state.latest
    }

    async fn run(&self, inference: &InferenceRequest) -> Result<EncodedImage, ImageError> {
        let generated = self.generator.generate(inference).await?;
        tokio::task::spawn_blocking(move || {
            EncodedImage::encode(&generated.data, &generated.mime_type)
        })
        .await
        .map_err(|e| ImageError::DataUri(format!("Encoding task failed: {e}")))?
    }

    /// Publish the image and leave `Pending` in one step, unless superseded.
    fn publish(
        &self,
        seq: u64,
        result: GenerationResult,
    ) -> Result<Arc<GenerationResult>, ImageError> {
        let mut state = self.lock();
        if state.latest != seq {
            tracing::debug!(seq, latest = state.latest, "discarding superseded result");
            return Err(ImageError::Superseded);
        }
        let result = Arc::new(result);
        state.current = Some(Arc::clone(&result));
        state.phase = Phase::Settled(Outcome::Success);
        drop(state);

        tracing::info!(seq, mime = result.image.mime_type(), "image generated");
        Ok(result)
    }

    fn fail(&self, seq: u64, error: ImageError) -> ImageError {
        let mut state = self.lock();
        if state.latest == seq {
            state.phase = Phase::Settled(Outcome::Failure);
        }
        drop(state);

        tracing::error!(seq, "error generating image: {error}");
        error
    }

    /// Write the current image to the documents directory and add it to the
    /// media library. Returns the library path.
    ///
    /// # Errors
    ///
    /// [`ImageError::NoImage`] without a current image, otherwise any file or
    /// handoff error.
    pub fn save(&self) -> Result<PathBuf, ImageError> {
        self.hand_off(self.library.as_ref())
    }

    /// Write the current image to the documents directory and pass it to the
    /// share target. Returns the shared path.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationSession::save`].
    pub fn share(&self) -> Result<PathBuf, ImageError> {
        self.hand_off(self.share.as_ref())
    }

    fn hand_off(&self, target: &dyn MediaTarget) -> Result<PathBuf, ImageError> {
        let result = self.current().ok_or(ImageError::NoImage)?;
        match deliver(&result.image, &self.documents_dir, target) {
            Ok(path) => {
                tracing::info!(handoff = target.name(), path = %path.display(), "image handed off");
                Ok(path)
            }
            Err(e) => {
                tracing::error!(handoff = target.name(), "error handing off image: {e}");
                Err(e)
            }
        }
    }
}

fn deliver(
    image: &EncodedImage,
    documents_dir: &Path,
    target: &dyn MediaTarget,
) -> Result<PathBuf, ImageError> {
    let file = materialize(image, documents_dir)?;
    target.deliver(&file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::image_generator::{GenerateFuture, GeneratedImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Notify, Semaphore};

    /// Echoes the prompt back as the image bytes. Prompts starting with
    /// "slow" signal `started`, then wait for a `release` permit (FIFO).
    struct FakeGenerator {
        calls: AtomicUsize,
        failure: Mutex<Option<(u16, &'static str)>>,
        mime_type: Mutex<&'static str>,
        started: Notify,
        release: Semaphore,
        last: Mutex<Option<InferenceRequest>>,
    }

    impl Default for FakeGenerator {
        fn default() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failure: Mutex::new(None),
                mime_type: Mutex::new("image/jpeg"),
                started: Notify::new(),
                release: Semaphore::new(0),
                last: Mutex::new(None),
            }
        }
    }

    impl FakeGenerator {
        fn fail_with(&self, status: u16, message: &'static str) {
            *self.failure.lock().unwrap() = Some((status, message));
        }

        fn recover(&self) {
            *self.failure.lock().unwrap() = None;
        }
    }

    impl ImageGenerator for FakeGenerator {
        fn generate(&self, request: &InferenceRequest) -> GenerateFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            let request = request.clone();
            Box::pin(async move {
                if request.prompt.starts_with("slow") {
                    self.started.notify_one();
                    self.release.acquire().await.expect("semaphore closed").forget();
                }
                let failure = *self.failure.lock().unwrap();
                if let Some((status, message)) = failure {
                    return Err(ImageError::Api { status, message: message.into() });
                }
                let mime_type = (*self.mime_type.lock().unwrap()).to_string();
                Ok(GeneratedImage { data: request.prompt.into_bytes(), mime_type })
            })
        }
    }

    #[derive(Default)]
    struct FakeTarget {
        delivered: Mutex<Vec<PathBuf>>,
        broken: bool,
    }

    impl MediaTarget for FakeTarget {
        fn name(&self) -> &str {
            "fake"
        }

        fn deliver(&self, path: &Path) -> Result<PathBuf, ImageError> {
            if self.broken {
                return Err(ImageError::Handoff { target: "fake".into(), message: "refused".into() });
            }
            self.delivered.lock().unwrap().push(path.to_path_buf());
            Ok(path.to_path_buf())
        }
    }

    struct Harness {
        session: Arc<GenerationSession>,
        generator: Arc<FakeGenerator>,
        library: Arc<FakeTarget>,
        share: Arc<FakeTarget>,
        documents: tempfile::TempDir,
    }

    fn harness_with(library: FakeTarget, share: FakeTarget) -> Harness {
        let generator = Arc::new(FakeGenerator::default());
        let library = Arc::new(library);
        let share = Arc::new(share);
        let documents = tempfile::tempdir().unwrap();
        let ctx = ServiceContext {
            generator: generator.clone(),
            library: library.clone(),
            share: share.clone(),
        };
        let session = Arc::new(GenerationSession::new(ctx, documents.path()));
        Harness { session, generator, library, share, documents }
    }

    fn harness() -> Harness {
        harness_with(FakeTarget::default(), FakeTarget::default())
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt, "flux.1-dev", "16:9")
    }

    #[tokio::test]
    async fn empty_fields_fail_validation_without_request() {
        let h = harness();
        for req in [
            GenerationRequest::new("", "flux.1-dev", "1:1"),
            GenerationRequest::new("a cat", "", "1:1"),
            GenerationRequest::new("a cat", "flux.1-dev", ""),
            GenerationRequest::new("   ", "flux.1-dev", "1:1"),
        ] {
            let err = h.session.generate(&req).await.unwrap_err();
            assert!(matches!(err, ImageError::Validation(_)), "{err:?}");
            assert_eq!(err.to_string(), "Please fill in all fields");
        }
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
        assert!(!h.session.is_loading());
        assert_eq!(h.session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn unknown_model_rejected_before_request() {
        let h = harness();
        let err = h.session.generate(&GenerationRequest::new("a cat", "dall-e-3", "1:1")).await;
        assert!(matches!(err, Err(ImageError::InvalidArgument(_))));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn success_publishes_data_uri() {
        let h = harness();
        let result = h.session.generate(&request("a cat")).await.unwrap();

        assert!(result.image.to_string().starts_with("data:image/jpeg;base64,"));
        assert_eq!(result.image.decode().unwrap(), b"a cat");
        assert_eq!(result.dimensions, ImageDimensions { width: 672, height: 384 });
        assert_eq!(result.model, "black-forest-labs/FLUX.1-dev");
        assert_eq!(h.session.current(), Some(result));
        assert_eq!(h.session.phase(), Phase::Settled(Outcome::Success));
        assert!(!h.session.is_loading());

        let sent = h.generator.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.model, "black-forest-labs/FLUX.1-dev");
        assert_eq!(sent.dimensions, ImageDimensions { width: 672, height: 384 });
    }

    #[tokio::test]
    async fn base_size_override_changes_dimensions() {
        let generator = Arc::new(FakeGenerator::default());
        let ctx = ServiceContext {
            generator: generator.clone(),
            library: Arc::new(FakeTarget::default()),
            share: Arc::new(FakeTarget::default()),
        };
        let session = GenerationSession::new(ctx, "unused").with_base_size(1024);
        let result = session.generate(&GenerationRequest::new("x", "flux.1-dev", "1/1")).await;
        assert_eq!(result.unwrap().dimensions, ImageDimensions { width: 1024, height: 1024 });
    }

    #[tokio::test]
    async fn base_size_below_alignment_rejected_before_request() {
        let generator = Arc::new(FakeGenerator::default());
        let ctx = ServiceContext {
            generator: generator.clone(),
            library: Arc::new(FakeTarget::default()),
            share: Arc::new(FakeTarget::default()),
        };
        let session = GenerationSession::new(ctx, "unused").with_base_size(10);
        let err = session.generate(&GenerationRequest::new("x", "flux.1-dev", "1:1")).await;
        assert!(matches!(err, Err(ImageError::InvalidArgument(_))), "{err:?}");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn remote_error_keeps_image_and_clears_loading() {
        let h = harness();
        let first = h.session.generate(&request("first")).await.unwrap();

        h.generator.fail_with(429, "rate limited");
        let err = h.session.generate(&request("second")).await.unwrap_err();

        assert_eq!(err.to_string(), "API error (429): rate limited");
        assert_eq!(h.session.current(), Some(first));
        assert!(!h.session.is_loading());
        assert_eq!(h.session.phase(), Phase::Settled(Outcome::Failure));
    }

    #[tokio::test]
    async fn newest_request_wins() {
        let h = harness();

        let slow = {
            let session = Arc::clone(&h.session);
            tokio::spawn(async move { session.generate(&request("slow one")).await })
        };
        h.generator.started.notified().await;
        assert!(h.session.is_loading());

        let fast = h.session.generate(&request("fast")).await.unwrap();
        assert_eq!(fast.image.decode().unwrap(), b"fast");
        assert!(!h.session.is_loading());

        h.generator.release.add_permits(1);
        let stale = slow.await.unwrap();
        assert!(matches!(stale, Err(ImageError::Superseded)));

        let current = h.session.current().unwrap();
        assert_eq!(current.image.decode().unwrap(), b"fast");
        assert_eq!(h.session.phase(), Phase::Settled(Outcome::Success));
    }

    #[tokio::test]
    async fn stale_failure_does_not_settle_newer_request() {
        let h = harness();
        let spawn = |prompt: &'static str| {
            let session = Arc::clone(&h.session);
            tokio::spawn(async move { session.generate(&request(prompt)).await })
        };

        let older = spawn("slow one");
        h.generator.started.notified().await;
        let newer = spawn("slow two");
        h.generator.started.notified().await;

        // Release only the older request, and make it fail.
        h.generator.fail_with(500, "boom");
        h.generator.release.add_permits(1);
        let err = older.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "API error (500): boom");
        assert!(h.session.is_loading(), "newer request is still in flight");

        h.generator.recover();
        h.generator.release.add_permits(1);
        let result = newer.await.unwrap().unwrap();
        assert_eq!(result.image.decode().unwrap(), b"slow two");
        assert!(!h.session.is_loading());
        assert_eq!(h.session.phase(), Phase::Settled(Outcome::Success));
    }

    #[tokio::test]
    async fn save_materializes_and_hands_to_library() {
        let h = harness();
        h.session.generate(&request("a cat")).await.unwrap();

        let saved = h.session.save().unwrap();

        assert_eq!(saved.parent(), Some(h.documents.path()));
        assert_eq!(saved.extension().unwrap(), "jpeg");
        assert_eq!(std::fs::read(&saved).unwrap(), b"a cat");
        assert_eq!(*h.library.delivered.lock().unwrap(), vec![saved]);
        assert!(h.share.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_writes_undecodable_payload_verbatim() {
        let h = harness();
        *h.generator.mime_type.lock().unwrap() = "image/heic";
        let result = h.session.generate(&request("heic bytes")).await.unwrap();
        assert_eq!(result.image.mime_type(), "image/heic");

        let saved = h.session.save().unwrap();
        assert_eq!(std::fs::read(&saved).unwrap(), b"heic bytes");
        let shared = h.session.share().unwrap();
        assert_eq!(std::fs::read(&shared).unwrap(), b"heic bytes");
    }

    #[tokio::test]
    async fn share_hands_to_share_target() {
        let h = harness();
        h.session.generate(&request("a cat")).await.unwrap();

        let shared = h.session.share().unwrap();
        assert_eq!(*h.share.delivered.lock().unwrap(), vec![shared]);
        assert!(h.library.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn save_without_image_fails() {
        let h = harness();
        assert!(matches!(h.session.save(), Err(ImageError::NoImage)));
        assert!(matches!(h.session.share(), Err(ImageError::NoImage)));
    }

    #[tokio::test]
    async fn handoff_failure_is_reported() {
        let h = harness_with(FakeTarget { broken: true, ..FakeTarget::default() }, FakeTarget::default());
        h.session.generate(&request("a cat")).await.unwrap();
        let err = h.session.save().unwrap_err();
        assert_eq!(err.to_string(), "fake failed: refused");
    }

    #[tokio::test]
    async fn form_round_trip_and_suggestion() {
        let h = harness();
        h.session.set_model("FLUX.1-schnell");
        h.session.set_aspect_ratio("9:16");
        let prompt = h.session.suggest_prompt();
        assert!(catalog::EXAMPLE_PROMPTS.contains(&prompt));
        assert_eq!(h.session.request(), GenerationRequest::new(prompt, "FLUX.1-schnell", "9:16"));

        let result = h.session.generate_from_form().await.unwrap();
        assert_eq!(result.dimensions, ImageDimensions { width: 384, height: 672 });
    }
}
