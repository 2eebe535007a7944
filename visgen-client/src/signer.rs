//! Request signing
//!
//! Produces the `Authorization`/`X-Date` headers and the canonical query
//! string for a provider call. The provider recomputes the signature on its
//! side from the request it receives, so every byte here matters: query
//! ordering, header block layout, the payload hash and the host name.
//!
//! Signing is a pure function of its inputs plus the instant passed in. The
//! key chain is derived again for every call and dropped with it.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use visgen_core::domain::credentials::Credentials;

use crate::error::{ClientError, Result};

pub const ALGORITHM: &str = "HMAC-SHA256";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const SIGNED_HEADERS: &str = "content-type;host;x-date";
pub const X_DATE: &str = "X-Date";

const SCOPE_TERMINATOR: &str = "request";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const CANONICAL_URI: &str = "/";

type HmacSha256 = Hmac<Sha256>;

/// Where a signature is valid: the host the provider sees, plus region and service
///
/// `host` must be the provider's own host even when requests are routed
/// through a local reverse proxy; the proxy host never appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    pub host: String,
    pub region: String,
    pub service: String,
}

/// The parts of an outbound request that go into its signature
#[derive(Debug, Clone, Copy)]
pub struct RequestToSign<'a> {
    pub method: &'a str,
    /// Extra query parameters; `Action` and `Version` are added on top
    pub query: &'a [(&'a str, &'a str)],
    pub action: &'a str,
    pub version: &'a str,
    /// Exact bytes that will be sent as the body
    pub body: &'a [u8],
}

/// Output of one signing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub authorization: String,
    pub x_date: String,
    /// Append verbatim after `?` in the request URL
    pub canonical_query: String,
    pub payload_hash: String,
    pub canonical_request: String,
    pub string_to_sign: String,
    pub signature: String,
}

impl SignedRequest {
    /// Headers to set on the request
    ///
    /// `Host` is left to the transport; it was signed from [`SigningScope::host`].
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.authorization).map_err(|_| {
                ClientError::Authentication(
                    "access key contains characters not allowed in a header".to_string(),
                )
            })?,
        );
        headers.insert(
            HeaderName::from_static("x-date"),
            HeaderValue::from_str(&self.x_date)
                .map_err(|e| ClientError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        Ok(headers)
    }
}

/// Signs a request at the current instant
pub fn sign_now(
    credentials: &Credentials,
    scope: &SigningScope,
    request: RequestToSign<'_>,
) -> Result<SignedRequest> {
    sign(credentials, scope, request, Utc::now())
}

/// Signs a request at the given instant
pub fn sign(
    credentials: &Credentials,
    scope: &SigningScope,
    request: RequestToSign<'_>,
    at: DateTime<Utc>,
) -> Result<SignedRequest> {
    if credentials.secret_key().trim().is_empty() {
        return Err(ClientError::Authentication(
            "secret key is missing".to_string(),
        ));
    }
    if credentials.access_key().trim().is_empty() {
        return Err(ClientError::Authentication(
            "access key is missing".to_string(),
        ));
    }

    // X-Date and the scope date come from this one string
    let x_date = at.format(TIMESTAMP_FORMAT).to_string();
    let short_date = &x_date[..8];

    let canonical_query = canonical_query_string(request.query, request.action, request.version);
    let payload_hash = payload_hash(request.body);
    let canonical_headers = canonical_headers(&scope.host, &x_date);

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.to_ascii_uppercase(),
        CANONICAL_URI,
        canonical_query,
        canonical_headers,
        SIGNED_HEADERS,
        payload_hash
    );

    let credential_scope = format!(
        "{}/{}/{}/{}",
        short_date, scope.region, scope.service, SCOPE_TERMINATOR
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        x_date,
        credential_scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let chain = SigningKeyChain::derive(
        credentials.secret_key(),
        short_date,
        &scope.region,
        &scope.service,
    )?;
    let signature = chain.sign(&string_to_sign)?;

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        credentials.access_key(),
        credential_scope,
        SIGNED_HEADERS,
        signature
    );

    Ok(SignedRequest {
        authorization,
        x_date,
        canonical_query,
        payload_hash,
        canonical_request,
        string_to_sign,
        signature,
    })
}

/// Query string with `Action` and `Version` merged in, sorted by encoded key
pub fn canonical_query_string(query: &[(&str, &str)], action: &str, version: &str) -> String {
    let mut params: BTreeMap<String, String> = BTreeMap::new();

    for (key, value) in query {
        params.insert(percent_encode(key), percent_encode(value));
    }
    params.insert(percent_encode("Action"), percent_encode(action));
    params.insert(percent_encode("Version"), percent_encode(version));

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lower-case hex SHA-256 of the body
pub fn payload_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Host names are case-insensitive on the wire; the provider signs them lower-cased
fn canonical_headers(host: &str, x_date: &str) -> String {
    format!(
        "content-type:{}\nhost:{}\nx-date:{}\n",
        CONTENT_TYPE_JSON,
        host.trim().to_ascii_lowercase(),
        x_date
    )
}

/// Percent-encode with the `encodeURIComponent` unreserved set
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => result.push(byte as char),
            _ => {
                let _ = write!(result, "%{:02X}", byte);
            }
        }
    }
    result
}

/// Keys derived from the secret for one signing call
///
/// date → region → service → signing, each an HMAC-SHA256 keyed by the
/// previous one. Only the last level is kept. Not `Clone`: a chain lives
/// exactly as long as its call.
pub struct SigningKeyChain {
    signing_key: Vec<u8>,
}

impl SigningKeyChain {
    pub fn derive(secret_key: &str, short_date: &str, region: &str, service: &str) -> Result<Self> {
        let date_key = hmac_sha256(secret_key.as_bytes(), short_date.as_bytes())?;
        let region_key = hmac_sha256(&date_key, region.as_bytes())?;
        let service_key = hmac_sha256(&region_key, service.as_bytes())?;
        let signing_key = hmac_sha256(&service_key, SCOPE_TERMINATOR.as_bytes())?;

        Ok(Self { signing_key })
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    /// Hex signature of `string_to_sign`
    pub fn sign(&self, string_to_sign: &str) -> Result<String> {
        Ok(hex::encode(hmac_sha256(
            &self.signing_key,
            string_to_sign.as_bytes(),
        )?))
    }
}

impl std::fmt::Debug for SigningKeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyChain").finish_non_exhaustive()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ClientError::Authentication(format!("invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
