//! Result extraction
//!
//! Turns the terminal provider response into the caller-facing result.

use tracing::warn;
use visgen_core::domain::job::JobStatus;
use visgen_core::domain::outcome::{GeneratedImage, Outcome};
use visgen_core::dto::task::TaskResultData;

use crate::error::{ClientError, Result};

/// Pick the output of a finished task
///
/// Only the first non-empty URL is used. A `failed` status becomes a
/// provider rejection with no code.
pub fn extract(data: &TaskResultData) -> Result<GeneratedImage> {
    match data.job_status() {
        Some(JobStatus::Done) => data
            .first_image_url()
            .map(|url| GeneratedImage::Url(url.to_string()))
            .ok_or(ClientError::EmptyResult),
        Some(JobStatus::Failed) => Err(ClientError::RejectedByProvider {
            code: None,
            message: "Generation failed, task status: failed".to_string(),
        }),
        _ => Err(ClientError::ParseError(format!(
            "task is not finished (status: {})",
            data.status.as_deref().unwrap_or("missing")
        ))),
    }
}

/// Collapse a generation result into an [`Outcome`]
pub fn into_outcome(result: Result<GeneratedImage>) -> Outcome {
    match result {
        Ok(image) => Outcome::Success(image),
        Err(err) => {
            warn!("Generation failed ({}): {}", err.kind(), err);
            Outcome::Failure(err.into())
        }
    }
}
