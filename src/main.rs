//! Imagegen - text-to-image generation CLI.

mod adapters;
mod catalog;
mod cli;
mod config;
mod context;
mod data_uri;
mod dimensions;
mod error;
mod output;
mod ports;
mod session;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::{resolve_aspect_ratio, resolve_model, ASPECT_RATIOS, MODELS};
use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::dimensions::image_dimensions;
use crate::error::ImageError;
use crate::session::{GenerationRequest, GenerationSession};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr; `IMAGEGEN_LOG` takes an `EnvFilter` directive.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("IMAGEGEN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), ImageError> {
    if cli.list_models {
        for entry in MODELS {
            println!("{:<24}{}", entry.label, entry.value);
        }
        return Ok(());
    }
    if cli.list_ratios {
        for entry in ASPECT_RATIOS {
            println!("{:<8}{}", entry.label, entry.value);
        }
        return Ok(());
    }

    // Load config
    let config_path = config::discover_config_path(cli.config.as_deref());
    let settings = Config::load(&config_path).map_err(ImageError::Config)?.resolve();
    tracing::debug!(config = %config_path.display(), base_url = %settings.base_url, "settings resolved");

    // Fill in the form
    let prompt = cli.resolve_prompt()?;
    let model = cli.model.clone().unwrap_or_else(|| settings.defaults.model.clone());
    let aspect_ratio =
        cli.aspect_ratio.clone().unwrap_or_else(|| settings.defaults.aspect_ratio.clone());
    let base_size = cli.base_size.unwrap_or(settings.defaults.base_size);

    // Validate before touching credentials or the network
    let placeholder = if cli.surprise { "suggested" } else { prompt.as_str() };
    GenerationRequest::new(placeholder, model.as_str(), aspect_ratio.as_str()).validate()?;
    resolve_model(&model).map_err(ImageError::InvalidArgument)?;
    let ratio = resolve_aspect_ratio(&aspect_ratio).map_err(ImageError::InvalidArgument)?;
    image_dimensions(ratio, base_size).map_err(ImageError::InvalidArgument)?;

    let ctx = ServiceContext::live(&settings)?;
    let session =
        GenerationSession::new(ctx, settings.documents_dir.clone()).with_base_size(base_size);
    session.set_model(model);
    session.set_aspect_ratio(aspect_ratio);
    if cli.surprise {
        eprintln!("Prompt: {}", session.suggest_prompt());
    } else {
        session.set_prompt(prompt);
    }

    // Generate
    let result = session.generate_from_form().await?;
    tracing::debug!(phase = ?session.phase(), "generation settled");
    eprintln!(
        "Generated: {} {} ({})",
        result.dimensions,
        result.image.mime_type(),
        result.model
    );
    if cli.data_uri {
        println!("{}", result.image);
    }

    if cli.save {
        let path = session.save()?;
        eprintln!("Saved: {}", path.display());
    }
    if cli.share {
        let path = session.share()?;
        eprintln!("Shared: {}", path.display());
    }

    Ok(())
}
