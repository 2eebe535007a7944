//! Configuration module
//!
//! Combines `VISGEN_*` environment settings with command-line overrides.

use anyhow::{Context, Result};
use visgen_client::ClientConfig;
use visgen_core::domain::credentials::Credentials;

/// Values given on the command line; each one wins over the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
    pub signing_host: Option<String>,
    pub req_key: Option<String>,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub credentials: Credentials,
}

impl Config {
    /// Loads the client settings from the environment and applies overrides
    pub fn load(overrides: Overrides) -> Result<Self> {
        Self::from_parts(ClientConfig::from_env(), overrides)
    }

    fn from_parts(mut client: ClientConfig, overrides: Overrides) -> Result<Self> {
        if let Some(endpoint) = overrides.endpoint {
            client.endpoint = endpoint;
        }
        if let Some(host) = overrides.signing_host {
            client.signing_host = host;
        }
        if let Some(req_key) = overrides.req_key {
            client.req_key = req_key;
        }

        client.validate().context("Invalid client configuration")?;

        // Missing keys are reported by the client as an authentication
        // failure, so commands that never sign still work without them
        let credentials = Credentials::new(
            overrides.access_key.unwrap_or_default().trim(),
            overrides.secret_key.unwrap_or_default().trim(),
        );

        Ok(Self {
            client,
            credentials,
        })
    }
}
