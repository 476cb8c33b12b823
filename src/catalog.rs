//! Fixed model, aspect-ratio and example-prompt catalogs.

use rand::seq::SliceRandom;

/// A labelled catalog entry: what the user sees and what the backend gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Human-facing label.
    pub label: &'static str,
    /// Backend value (model id or ratio string).
    pub value: &'static str,
}

/// Selectable inference models.
pub const MODELS: &[Entry] = &[
    Entry { label: "flux.1-dev", value: "black-forest-labs/FLUX.1-dev" },
    Entry { label: "FLUX.1-schnell", value: "black-forest-labs/FLUX.1-schnell" },
    Entry { label: "stable diffusion 3.5L", value: "stabilityai/stable-diffusion-3.5-large" },
    Entry { label: "stable diffusion XL", value: "stabilityai/stable-diffusion-xl-base-1.0" },
    Entry { label: "stable diffusion 1.5", value: "stable-diffusion-v1-5/stable-diffusion-v1-5" },
];

/// Selectable aspect ratios.
pub const ASPECT_RATIOS: &[Entry] = &[
    Entry { label: "1:1", value: "1/1" },
    Entry { label: "4:3", value: "4/3" },
    Entry { label: "16:9", value: "16/9" },
    Entry { label: "9:16", value: "9/16" },
];

/// Prompts offered by [`suggest_prompt`].
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "A futuristic city skyline at sunset",
    "A serene forest with a river running through it",
    "A majestic mountain range with snow-capped peaks",
    "A bustling marketplace in a medieval town",
    "A tranquil beach with crystal clear waters",
];

/// Look up an entry by label or value. Labels match case-insensitively.
fn lookup(entries: &'static [Entry], name: &str) -> Option<&'static Entry> {
    let name = name.trim();
    entries.iter().find(|e| e.value == name || e.label.eq_ignore_ascii_case(name))
}

/// Resolve a model label or backend id to the backend model id.
///
/// # Errors
///
/// Returns an error if the model is not in [`MODELS`].
pub fn resolve_model(name: &str) -> Result<&'static str, String> {
    lookup(MODELS, name).map(|e| e.value).ok_or_else(|| {
        let valid: Vec<&str> = MODELS.iter().map(|e| e.label).collect();
        format!("Unknown model '{name}'. Valid: {valid:?}")
    })
}

/// Resolve an aspect-ratio label (`16:9`) or value (`16/9`) to the ratio value.
///
/// # Errors
///
/// Returns an error if the ratio is not in [`ASPECT_RATIOS`].
pub fn resolve_aspect_ratio(name: &str) -> Result<&'static str, String> {
    lookup(ASPECT_RATIOS, name).map(|e| e.value).ok_or_else(|| {
        let valid: Vec<&str> = ASPECT_RATIOS.iter().map(|e| e.label).collect();
        format!("Unsupported aspect ratio '{name}'. Valid: {valid:?}")
    })
}

/// Pick one example prompt uniformly at random.
#[must_use]
pub fn suggest_prompt() -> &'static str {
    EXAMPLE_PROMPTS.choose(&mut rand::thread_rng()).copied().unwrap_or(EXAMPLE_PROMPTS[0])
}
