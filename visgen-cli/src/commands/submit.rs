//! Submit command handler

use anyhow::Result;
use colored::*;

use super::{RequestArgs, build_client};
use crate::config::Config;

/// Submit a task and print its id
pub async fn handle_submit(args: RequestArgs, config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let task_id = client
        .submit_task(&config.credentials, &args.to_request())
        .await?;

    eprintln!("{}", "✓ Task submitted".green());
    println!("{}", task_id);
    eprintln!(
        "  {}",
        format!("Check it with: visgen status --task-id {}", task_id).dimmed()
    );

    Ok(())
}
