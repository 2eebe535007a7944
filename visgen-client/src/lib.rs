//! Visgen HTTP Client
//!
//! Client for the provider's asynchronous image-generation API: every call is
//! signed with an HMAC-SHA256 scheme, a generation is submitted as a task and
//! then polled until it finishes, fails, or runs out of attempts.
//!
//! # Example
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use visgen_client::{ClientConfig, VisualClient};
//! use visgen_core::domain::credentials::Credentials;
//! use visgen_core::domain::outcome::{GeneratedImage, Outcome};
//! use visgen_core::dto::generate::GenerateRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VisualClient::new(ClientConfig::default())?;
//!     let credentials = Credentials::new("AKLT...", "secret");
//!     let request = GenerateRequest::new("studio shot of a cardboard box");
//!
//!     match client.generate(&credentials, &request, &CancellationToken::new()).await {
//!         Outcome::Success(GeneratedImage::Url(url)) => println!("{}", url),
//!         Outcome::Success(_) => {}
//!         Outcome::Failure(failure) => eprintln!("{}", failure),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod generate;
pub mod poller;
pub mod signer;
mod tasks;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use generate::{generate, generate_with_policy};
pub use poller::{JobPoller, PollPolicy};
pub use tasks::TaskApi;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use visgen_core::domain::credentials::Credentials;
use visgen_core::dto::task::{ProviderResponse, TaskResultData};

use crate::signer::RequestToSign;

/// HTTP client for the provider's visual API
///
/// Cheap to clone; clones share the underlying connection pool. Holds no
/// credentials: each call takes the pair it should be signed with.
#[derive(Debug, Clone)]
pub struct VisualClient {
    config: ClientConfig,
    client: Client,
}

impl VisualClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `config` - Endpoint, signing scope and model settings
    ///
    /// # Example
    /// ```
    /// use visgen_client::{ClientConfig, VisualClient};
    ///
    /// let client = VisualClient::new(ClientConfig::default()).unwrap();
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(config, client)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The timeout in
    /// `config` is not applied to a client supplied this way.
    pub fn with_client(mut config: ClientConfig, client: Client) -> Result<Self> {
        config.validate()?;
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();
        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =============================================================================
    // Signed Calls
    // =============================================================================

    /// Sign and POST one action call
    ///
    /// The body is hashed for the signature and then moved into the request
    /// untouched. `decode` turns the raw response into the action's result.
    async fn post_signed<T>(
        &self,
        credentials: &Credentials,
        action: &str,
        body: Vec<u8>,
        decode: Decoder<T>,
    ) -> Result<T> {
        let signed = signer::sign_now(
            credentials,
            &self.config.signing_scope(),
            RequestToSign {
                method: "POST",
                query: &[],
                action,
                version: &self.config.api_version,
                body: &body,
            },
        )?;

        let url = format!("{}?{}", self.config.endpoint, signed.canonical_query);
        debug!("POST {} ({} byte body)", url, body.len());

        let response = self
            .client
            .post(&url)
            .headers(signed.headers()?)
            .body(body)
            .send()
            .await?;

        self.handle_response(response, decode).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a provider response and deserialize its `data`
    async fn handle_response<T>(&self, response: reqwest::Response, decode: Decoder<T>) -> Result<T> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        decode(status, content_type.as_deref(), &body)
    }
}

/// Maps (HTTP status, content type, body) to an action result
type Decoder<T> = fn(u16, Option<&str>, &str) -> Result<T>;

/// Classify a raw response into `data`, a gateway error or a provider rejection
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<T> {
    let is_html = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));

    if !(200..300).contains(&status) || is_html {
        warn!("Provider gateway returned status {} ({:?})", status, content_type);
        return Err(ClientError::gateway(status, body));
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|_| ClientError::gateway(status, body))?;

    if value.get("code").is_none() {
        return Err(gateway_metadata_error(&value).unwrap_or_else(|| {
            ClientError::ParseError("response has no `code` field".to_string())
        }));
    }

    let envelope: ProviderResponse<serde_json::Value> = serde_json::from_value(value)
        .map_err(|e| ClientError::ParseError(format!("invalid response envelope: {}", e)))?;

    if !envelope.is_success() {
        warn!(
            "Provider rejected request (code {}, request_id {:?})",
            envelope.code, envelope.request_id
        );
        return Err(ClientError::rejected(envelope.code, envelope.message));
    }

    let data = envelope
        .data
        .ok_or_else(|| ClientError::ParseError("response is missing `data`".to_string()))?;

    serde_json::from_value(data)
        .map_err(|e| ClientError::ParseError(format!("unexpected `data` shape: {}", e)))
}

/// Like [`decode_envelope`], but a failing `code` whose `data` still reports
/// a known task status is handed back as that status
///
/// The query endpoint may answer `not_found` with a failing code right after
/// submission; whether that ends polling is decided by the poller's grace
/// window, not here.
pub(crate) fn decode_result_envelope(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<TaskResultData> {
    match decode_envelope::<TaskResultData>(status, content_type, body) {
        Err(err @ ClientError::RejectedByProvider { .. }) => {
            let reported = serde_json::from_str::<ProviderResponse<TaskResultData>>(body)
                .ok()
                .and_then(|envelope| envelope.data)
                .filter(|data| data.job_status().is_some());

            match reported {
                Some(data) => {
                    debug!("Failing code carries task status {:?}, deferring to poller", data.status);
                    Ok(data)
                }
                None => Err(err),
            }
        }
        other => other,
    }
}

/// Errors raised by the API gateway itself (bad signature, unknown action)
/// come back as `ResponseMetadata.Error` instead of the usual envelope
fn gateway_metadata_error(value: &serde_json::Value) -> Option<ClientError> {
    let error = value.get("ResponseMetadata")?.get("Error")?;
    let code = error.get("Code").and_then(|c| c.as_str()).unwrap_or("Unknown");
    let message = error.get("Message").and_then(|m| m.as_str()).unwrap_or("");

    Some(ClientError::RejectedByProvider {
        code: error.get("CodeN").and_then(|c| c.as_i64()),
        message: format!("{}: {}", code, message),
    })
}
