//! Visgen CLI
//!
//! Command-line front end for the image-generation client.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, Overrides};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "visgen")]
#[command(about = "Text-to-image generation CLI", long_about = None)]
struct Cli {
    /// Access key id
    #[arg(long, env = "VISGEN_ACCESS_KEY", hide_env_values = true, global = true)]
    access_key: Option<String>,

    /// Secret access key
    #[arg(long, env = "VISGEN_SECRET_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// URL requests are sent to (e.g. a reverse-proxy path)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Host name the signature is computed for
    #[arg(long, global = true)]
    signing_host: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    req_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for URLs and task ids
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visgen=info,visgen_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(Overrides {
        access_key: cli.access_key,
        secret_key: cli.secret_key,
        endpoint: cli.endpoint,
        signing_host: cli.signing_host,
        req_key: cli.req_key,
    })?;

    handle_command(cli.command, &config).await
}
