//! Client configuration
//!
//! Where requests go, what they are signed for, and which model they target.
//! Credentials are deliberately not part of this: they are passed per call.

use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::signer::SigningScope;

pub const DEFAULT_ENDPOINT: &str = "https://visual.volcengineapi.com";
pub const DEFAULT_SIGNING_HOST: &str = "visual.volcengineapi.com";
pub const DEFAULT_REGION: &str = "cn-north-1";
pub const DEFAULT_SERVICE: &str = "cv";
pub const DEFAULT_REQ_KEY: &str = "jimeng_t2i_v40";
pub const DEFAULT_API_VERSION: &str = "2022-08-31";

pub const SUBMIT_ACTION: &str = "CVSync2AsyncSubmitTask";
pub const GET_RESULT_ACTION: &str = "CVSync2AsyncGetResult";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// URL requests are sent to; may be a same-origin reverse-proxy path
    /// (e.g. "http://localhost:5173/api/jimeng")
    pub endpoint: String,

    /// Host the provider sees, used for signing regardless of `endpoint`
    pub signing_host: String,

    pub region: String,

    pub service: String,

    /// Model identifier sent as `req_key`
    pub req_key: String,

    pub api_version: String,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Configuration pointing straight at the provider
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            signing_host: DEFAULT_SIGNING_HOST.to_string(),
            region: DEFAULT_REGION.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            req_key: DEFAULT_REQ_KEY.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// All variables are optional and fall back to the defaults:
    /// - VISGEN_ENDPOINT
    /// - VISGEN_SIGNING_HOST
    /// - VISGEN_REGION
    /// - VISGEN_SERVICE
    /// - VISGEN_REQ_KEY
    /// - VISGEN_API_VERSION
    /// - VISGEN_REQUEST_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();
        let string = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let request_timeout = lookup("VISGEN_REQUEST_TIMEOUT")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            endpoint: string("VISGEN_ENDPOINT", defaults.endpoint),
            signing_host: string("VISGEN_SIGNING_HOST", defaults.signing_host),
            region: string("VISGEN_REGION", defaults.region),
            service: string("VISGEN_SERVICE", defaults.service),
            req_key: string("VISGEN_REQ_KEY", defaults.req_key),
            api_version: string("VISGEN_API_VERSION", defaults.api_version),
            request_timeout,
        }
    }

    /// Routes requests through a reverse proxy while keeping the signing host
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_req_key(mut self, req_key: impl Into<String>) -> Self {
        self.req_key = req_key.into();
        self
    }

    /// Scope used when signing requests
    pub fn signing_scope(&self) -> SigningScope {
        SigningScope {
            host: self.signing_host.clone(),
            region: self.region.clone(),
            service: self.service.clone(),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> { Err(ClientError::InvalidRequest(msg.to_string())) };

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return invalid("endpoint must start with http:// or https://");
        }

        if self.signing_host.is_empty() {
            return invalid("signing_host cannot be empty");
        }

        if self.signing_host.contains("://") || self.signing_host.contains('/') {
            return invalid("signing_host must be a bare host name, without scheme or path");
        }

        if self.region.is_empty() || self.service.is_empty() {
            return invalid("region and service cannot be empty");
        }

        if self.req_key.is_empty() {
            return invalid("req_key cannot be empty");
        }

        if self.api_version.is_empty() {
            return invalid("api_version cannot be empty");
        }

        if self.request_timeout.is_zero() {
            return invalid("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
