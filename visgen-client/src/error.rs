//! Error types for the Visgen client

use thiserror::Error;
use visgen_core::domain::job::JobStatus;
use visgen_core::domain::outcome::{Failure, FailureKind};

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Longest body excerpt carried by a gateway error, in characters
pub const SNIPPET_MAX_CHARS: usize = 100;

/// Errors that can occur while generating an image
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credential material missing; raised before any network call
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Non-2xx status or a non-JSON body, usually an intermediary's error page
    #[error("{}", gateway_message(.status, .snippet))]
    Gateway {
        /// HTTP status code
        status: u16,
        /// Body excerpt with markup stripped, at most 100 characters
        snippet: String,
    },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Response was JSON but lacked the fields we need
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Provider answered with a failing code, or the task itself failed
    #[error("{message}")]
    RejectedByProvider {
        /// Provider application code, absent when the task status was `failed`
        code: Option<i64>,
        /// Provider message, verbatim
        message: String,
    },

    /// Task finished without an output image
    #[error("Task finished but returned no image URL")]
    EmptyResult,

    /// Task stayed not_found/expired past the grace window
    #[error("Task expired or not found: {status}")]
    Expired {
        /// Last status observed
        status: JobStatus,
    },

    /// Attempt cap exhausted
    #[error("Generation timed out after {attempts} poll attempts, please try again later")]
    Timeout {
        /// Number of result queries issued
        attempts: u32,
    },

    /// Caller cancelled the operation
    #[error("Generation cancelled")]
    Cancelled,

    /// Request rejected locally
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Build a gateway error from a raw response body
    pub fn gateway(status: u16, body: &str) -> Self {
        Self::Gateway {
            status,
            snippet: body_snippet(body),
        }
    }

    /// Build a rejection from a provider envelope
    pub fn rejected(code: i64, message: Option<String>) -> Self {
        Self::RejectedByProvider {
            code: Some(code),
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("API error code: {}", code)),
        }
    }

    /// Classification of this error in the caller-facing taxonomy
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Authentication(_) => FailureKind::Authentication,
            Self::Gateway { .. } | Self::RequestFailed(_) | Self::ParseError(_) => {
                FailureKind::Gateway
            }
            Self::RejectedByProvider { .. } => FailureKind::RejectedByProvider,
            Self::EmptyResult => FailureKind::EmptyResult,
            Self::Expired { .. } => FailureKind::Expired,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Cancelled => FailureKind::Cancelled,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }

    /// Check if the gateway could not find the route (typically a bad proxy path)
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Gateway { status, snippet } => route_missing(status, snippet),
            _ => false,
        }
    }
}

impl From<ClientError> for Failure {
    fn from(err: ClientError) -> Self {
        Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn route_missing(status: &u16, snippet: &str) -> bool {
    *status == 404 || snippet.contains("Page Not Found")
}

fn gateway_message(status: &u16, snippet: &str) -> String {
    if route_missing(status, snippet) {
        format!(
            "Endpoint not found ({}), check the reverse-proxy route to the provider: {}",
            status, snippet
        )
    } else {
        format!("Network request failed ({}): {}", status, snippet)
    }
}

/// Strip markup from a body and cut it to [`SNIPPET_MAX_CHARS`] characters
pub fn body_snippet(body: &str) -> String {
    let mut text = String::with_capacity(body.len().min(1024));
    let mut in_tag = false;

    for ch in body.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            c => text.push(c),
        }
    }

    text.trim_end().chars().take(SNIPPET_MAX_CHARS).collect()
}
