//! Sign command handler
//!
//! Shows every intermediate signing value for a request so it can be
//! compared against what the provider reports on a signature mismatch.
//! Nothing is sent.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::*;
use visgen_client::config::SUBMIT_ACTION;
use visgen_client::signer::{self, CONTENT_TYPE_JSON, RequestToSign, SignedRequest, X_DATE};

use crate::config::Config;

/// Arguments of `sign`
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Action to sign for
    #[arg(long, default_value = SUBMIT_ACTION)]
    pub action: String,

    /// Exact JSON body; signed byte for byte
    #[arg(long, default_value = "{}")]
    pub body: String,

    /// Signing instant in RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Print the canonical request, string to sign and resulting headers
pub fn handle_sign(args: SignArgs, config: &Config) -> Result<()> {
    serde_json::from_str::<serde_json::Value>(&args.body).context("--body is not valid JSON")?;

    let request = RequestToSign {
        method: "POST",
        query: &[],
        action: &args.action,
        version: &config.client.api_version,
        body: args.body.as_bytes(),
    };
    let at = args.at.unwrap_or_else(Utc::now);
    let signed = signer::sign(
        &config.credentials,
        &config.client.signing_scope(),
        request,
        at,
    )?;

    print_signed(&signed, &config.client.signing_host);
    Ok(())
}

fn print_signed(signed: &SignedRequest, host: &str) {
    section("Canonical query");
    println!("{}", signed.canonical_query);

    section("Payload hash");
    println!("{}", signed.payload_hash);

    section("Canonical request");
    println!("{}", signed.canonical_request);

    section("String to sign");
    println!("{}", signed.string_to_sign);

    section("Headers");
    println!("Host: {}", host);
    println!("Content-Type: {}", CONTENT_TYPE_JSON);
    println!("{}: {}", X_DATE, signed.x_date);
    println!("Authorization: {}", signed.authorization);
}

fn section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(60).dimmed());
}
