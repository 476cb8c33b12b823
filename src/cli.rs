//! CLI argument parsing with clap.

use clap::Parser;

/// Text-to-image generation against a hosted inference endpoint.
#[derive(Parser, Debug)]
#[command(name = "imagegen", version, about)]
pub struct Cli {
    /// Text prompt describing the desired image.
    #[arg(conflicts_with_all = ["prompt_file", "surprise"])]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "surprise")]
    pub prompt_file: Option<String>,

    /// Use a random example prompt.
    #[arg(long)]
    pub surprise: bool,

    /// Model label or id (see --list-models). Defaults to the config value.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Aspect ratio, e.g. 1:1, 16:9 (see --list-ratios). Defaults to the config value.
    #[arg(short, long)]
    pub aspect_ratio: Option<String>,

    /// Base size the dimensions are scaled around.
    #[arg(long)]
    pub base_size: Option<u32>,

    /// Save the image to the media library.
    #[arg(long)]
    pub save: bool,

    /// Open the image with the share command.
    #[arg(long)]
    pub share: bool,

    /// Print the image as a data URI on stdout.
    #[arg(long)]
    pub data_uri: bool,

    /// List available models and exit.
    #[arg(long)]
    pub list_models: bool,

    /// List available aspect ratios and exit.
    #[arg(long)]
    pub list_ratios: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from the positional argument or the file flag.
    ///
    /// Returns an empty prompt when neither is given (and `--surprise` is
    /// handled by the caller); emptiness is reported by request validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn resolve_prompt(&self) -> Result<String, std::io::Error> {
        if let Some(ref text) = self.prompt {
            Ok(text.clone())
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path).map(|s| s.trim().to_string())
        } else {
            Ok(String::new())
        }
    }
}
