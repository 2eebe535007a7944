//! Provider task DTOs
//!
//! Bodies for the two RPC-style actions (task submission and result query)
//! and the response envelope shared by both.

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;
use crate::dto::generate::GenerateRequest;

/// `code` value denoting request-level success
pub const SUCCESS_CODE: i64 = 10000;

/// Serialized options sent with every result query
pub const RETURN_URL_REQ_JSON: &str = r#"{"return_url":true}"#;

/// Body of the task submission action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTaskBody {
    pub req_key: String,
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl SubmitTaskBody {
    pub fn from_request(req_key: impl Into<String>, request: &GenerateRequest) -> Self {
        Self {
            req_key: req_key.into(),
            prompt: request.prompt.clone(),
            image_urls: request.reference_image_url.iter().cloned().collect(),
            scale: request.reference_weight,
            width: request.resolution.width,
            height: request.resolution.height,
        }
    }
}

/// Body of the result query action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResultBody {
    pub req_key: String,
    pub task_id: String,
    pub req_json: String,
}

impl GetResultBody {
    pub fn new(req_key: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            req_key: req_key.into(),
            task_id: task_id.into(),
            req_json: RETURN_URL_REQ_JSON.to_string(),
        }
    }
}

/// Envelope wrapping every provider response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    /// Absent on most failures; a missing field decodes as `None`
    pub data: Option<T>,
}

impl<T> ProviderResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// `data` of a successful submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskData {
    pub task_id: String,
}

/// `data` of a result query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
}

impl TaskResultData {
    /// Parsed status, `None` when missing or not a known token
    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.as_deref().and_then(JobStatus::from_token)
    }

    /// First output URL; any further outputs are ignored
    pub fn first_image_url(&self) -> Option<&str> {
        self.image_urls
            .as_ref()
            .and_then(|urls| urls.iter().find(|url| !url.is_empty()))
            .map(String::as_str)
    }
}
