//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod generate;
mod sign;
mod status;
mod submit;

pub use generate::{GenerateArgs, RequestArgs};
pub use sign::SignArgs;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use visgen_client::VisualClient;
use visgen_core::domain::job::JobStatus;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an image and wait for the result
    Generate(GenerateArgs),
    /// Submit a generation task without waiting
    Submit(RequestArgs),
    /// Query a submitted task once
    Status {
        /// Task id printed by `submit`
        #[arg(long)]
        task_id: String,
    },
    /// Print the signing steps for a request without sending it
    Sign(SignArgs),
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Generate(args) => generate::handle_generate(args, config).await,
        Commands::Submit(args) => submit::handle_submit(args, config).await,
        Commands::Status { task_id } => status::handle_status(&task_id, config).await,
        Commands::Sign(args) => sign::handle_sign(args, config),
    }
}

fn build_client(config: &Config) -> Result<VisualClient> {
    VisualClient::new(config.client.clone()).context("Failed to create HTTP client")
}

/// Colorize a provider status token
fn colorize_status(token: &str) -> ColoredString {
    match JobStatus::from_token(token) {
        Some(JobStatus::Queued) => token.yellow(),
        Some(JobStatus::Running) => token.cyan(),
        Some(JobStatus::Done) => token.green(),
        Some(JobStatus::Failed) => token.red(),
        Some(JobStatus::NotFound | JobStatus::Expired) => token.red().dimmed(),
        None => token.normal(),
    }
}
