//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dimensions::DEFAULT_BASE_SIZE;

/// Environment variable overriding `inference.base_url`.
pub const BASE_URL_ENV: &str = "HF_URL";
/// Environment variable overriding `inference.token`.
pub const TOKEN_ENV: &str = "HF_TOKEN";

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models/";

/// Top-level configuration, as written in the TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Inference endpoint settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Default form values, used when CLI flags are not given.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Where materialized and saved images go.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Share target settings.
    #[serde(default)]
    pub share: ShareConfig,
}

/// Inference endpoint configuration.
#[derive(Debug, Default, Deserialize)]
pub struct InferenceConfig {
    /// Base URL; the model id is appended to it.
    pub base_url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
}

/// Default form values from the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model label or id.
    pub model: String,
    /// Default aspect ratio label or value.
    pub aspect_ratio: String,
    /// Base size for the dimension calculation.
    pub base_size: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: "flux.1-dev".to_string(),
            aspect_ratio: "1:1".to_string(),
            base_size: DEFAULT_BASE_SIZE,
        }
    }
}

/// Storage locations.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// App-private directory for materialized files.
    pub documents_dir: Option<PathBuf>,
    /// Directory acting as the media library.
    pub library_dir: Option<PathBuf>,
}

/// Share target configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ShareConfig {
    /// Opener program and leading arguments; the file path is appended.
    pub command: Option<Vec<String>>,
}

/// Fully resolved settings handed to the rest of the program.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Inference base URL.
    pub base_url: String,
    /// Bearer token, if any was configured.
    pub token: Option<String>,
    /// Default form values.
    pub defaults: DefaultsConfig,
    /// App-private directory for materialized files.
    pub documents_dir: PathBuf,
    /// Media library directory.
    pub library_dir: PathBuf,
    /// Share opener command.
    pub share_command: Vec<String>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Resolve against the process environment.
    #[must_use]
    pub fn resolve(self) -> Settings {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using `env` to look up variables; environment wins over the file.
    #[must_use]
    pub fn resolve_with(self, env: impl Fn(&str) -> Option<String>) -> Settings {
        let home = env("HOME").map(PathBuf::from);
        let under_home = |rel: &str, fallback: &str| {
            home.as_ref().map_or_else(|| PathBuf::from(fallback), |h| h.join(rel))
        };

        Settings {
            base_url: env(BASE_URL_ENV)
                .filter(|v| !v.is_empty())
                .or(self.inference.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: env(TOKEN_ENV).filter(|v| !v.is_empty()).or(self.inference.token),
            defaults: self.defaults,
            documents_dir: self
                .storage
                .documents_dir
                .unwrap_or_else(|| under_home(".local/share/imagegen/documents", "documents")),
            library_dir: self
                .storage
                .library_dir
                .unwrap_or_else(|| under_home("Pictures/imagegen", "library")),
            share_command: self.share.command.unwrap_or_else(default_share_command),
        }
    }
}

fn default_share_command() -> Vec<String> {
    let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
    vec![opener.to_string()]
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `IMAGEGEN_CONFIG` environment variable
/// 3. `~/.config/imagegen/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("IMAGEGEN_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/imagegen/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/imagegen/config.toml")
    } else {
        PathBuf::from("imagegen.toml")
    }
}
