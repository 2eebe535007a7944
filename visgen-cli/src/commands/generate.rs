//! Generate command handler
//!
//! Runs the whole lifecycle and prints the image URL, or saves the image
//! when `--output` is given. Ctrl-C cancels the run.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use visgen_core::domain::image::{AspectRatio, Resolution};
use visgen_core::domain::outcome::{GeneratedImage, Outcome};
use visgen_core::dto::generate::{DEFAULT_REFERENCE_WEIGHT, GenerateRequest};

use super::build_client;
use crate::config::Config;

/// What to generate
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Text prompt
    #[arg(short, long)]
    pub prompt: String,

    /// Publicly reachable reference image
    #[arg(long)]
    pub reference_url: Option<String>,

    /// Influence of the reference image (0.0 to 1.0)
    #[arg(long, default_value_t = DEFAULT_REFERENCE_WEIGHT)]
    pub reference_weight: f64,

    /// Aspect ratio preset: 1:1, 4:3, 16:9 or 9:16
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub aspect_ratio: Option<AspectRatio>,

    /// Output width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<u32>,
}

impl RequestArgs {
    /// Build the request; explicit dimensions win over a preset
    pub fn to_request(&self) -> GenerateRequest {
        let resolution = match (self.width, self.height, self.aspect_ratio) {
            (Some(width), Some(height), _) => Resolution::new(width, height),
            (_, _, Some(ratio)) => ratio.resolution(),
            _ => Resolution::default(),
        };

        let request = GenerateRequest::new(self.prompt.clone()).with_resolution(resolution);
        match &self.reference_url {
            Some(url) => request.with_reference(url.clone(), self.reference_weight),
            None => request,
        }
    }
}

/// Arguments of `generate`
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Download the image to this file instead of printing its URL
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run one generation to completion
pub async fn handle_generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let request = args.request.to_request();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    eprintln!(
        "{} {} ({})",
        "▸".cyan(),
        "Generating image...".bold(),
        request.resolution.to_string().dimmed()
    );

    let outcome = match &args.output {
        Some(_) => {
            client
                .generate_bytes(&config.credentials, &request, &cancel)
                .await
        }
        None => client.generate(&config.credentials, &request, &cancel).await,
    };

    match outcome {
        Outcome::Success(GeneratedImage::Url(url)) => {
            eprintln!("{}", "✓ Image ready".green());
            println!("{}", url);
        }
        Outcome::Success(GeneratedImage::Bytes(bytes)) => {
            let path = args
                .output
                .context("Received image bytes without an output path")?;
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Saved {} bytes to {}",
                "✓".green(),
                bytes.len(),
                path.display().to_string().bold()
            );
        }
        Outcome::Failure(failure) => {
            eprintln!("{} {}", "✗".red(), failure.kind.to_string().red().bold());
            eprintln!("  {}", failure.message);
            bail!("Generation failed: {}", failure.kind);
        }
    }

    Ok(())
}
