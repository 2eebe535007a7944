//! Status command handler

use anyhow::Result;
use colored::*;

use super::{build_client, colorize_status};
use crate::config::Config;

/// Query a task once and print its state
pub async fn handle_status(task_id: &str, config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let data = client.get_result(&config.credentials, task_id).await?;

    let status = data.status.as_deref().unwrap_or("unknown");
    println!("{} Task {}", "▸".cyan(), task_id.dimmed());
    println!("    Status: {}", colorize_status(status));

    match data.image_urls.as_deref() {
        Some(urls) if !urls.is_empty() => {
            println!("    Images:");
            for url in urls {
                println!("      {}", url);
            }
        }
        _ => println!("    Images: {}", "none yet".dimmed()),
    }

    Ok(())
}
