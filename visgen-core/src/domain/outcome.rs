//! Final result of a generation call

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller gets back from a generate call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(GeneratedImage),
    Failure(Failure),
}

impl Outcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(Failure {
            kind,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure kind, if this is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

/// Successful generation payload
#[derive(Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Provider-hosted URL of the first output image
    Url(String),
    /// Downloaded image bytes
    Bytes(Vec<u8>),
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Classified failure with a message suitable for direct display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Failure taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or empty credential material, detected before any network call
    Authentication,
    /// Non-2xx, HTML or otherwise non-JSON transport response
    Gateway,
    /// Provider answered with a failing application code or a failed task
    RejectedByProvider,
    /// Task finished without an output reference
    EmptyResult,
    /// Task stayed not_found/expired past the grace window
    Expired,
    /// Attempt cap exhausted
    Timeout,
    /// Caller aborted the operation
    Cancelled,
    /// Request rejected locally before submission
    InvalidRequest,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication_error",
            Self::Gateway => "gateway_error",
            Self::RejectedByProvider => "rejected_by_provider",
            Self::EmptyResult => "empty_result",
            Self::Expired => "expired",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
