//! End-to-end generation
//!
//! Submit, poll, extract. Every failure along the way is folded into an
//! [`Outcome`] instead of being returned as an error.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use visgen_core::domain::credentials::Credentials;
use visgen_core::domain::job::Job;
use visgen_core::domain::outcome::{GeneratedImage, Outcome};
use visgen_core::dto::generate::GenerateRequest;

use crate::VisualClient;
use crate::error::{ClientError, Result};
use crate::extractor;
use crate::poller::{JobPoller, PollPolicy};
use crate::tasks::TaskApi;

/// Generate one image with the default polling policy
pub async fn generate(
    api: &dyn TaskApi,
    credentials: &Credentials,
    request: &GenerateRequest,
    cancel: &CancellationToken,
) -> Outcome {
    generate_with_policy(api, credentials, request, PollPolicy::default(), cancel).await
}

/// Generate one image with custom polling limits
pub async fn generate_with_policy(
    api: &dyn TaskApi,
    credentials: &Credentials,
    request: &GenerateRequest,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Outcome {
    extractor::into_outcome(run(api, credentials, request, policy, cancel).await)
}

async fn run(
    api: &dyn TaskApi,
    credentials: &Credentials,
    request: &GenerateRequest,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<GeneratedImage> {
    if credentials.is_incomplete() {
        return Err(ClientError::Authentication(
            "access key and secret key are required".to_string(),
        ));
    }
    request.validate().map_err(ClientError::InvalidRequest)?;

    if cancel.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    let task_id = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
        result = api.submit_task(credentials, request) => result?,
    };

    let mut job = Job::submitted(task_id);
    let terminal = JobPoller::new(api, credentials)
        .with_policy(policy)
        .run(&mut job, cancel)
        .await?;

    let image = extractor::extract(&terminal)?;
    info!("Task {} produced an image after {} attempt(s)", job.id, job.attempt);
    Ok(image)
}

impl VisualClient {
    /// Generate one image and return its provider-hosted URL
    ///
    /// # Arguments
    /// * `credentials` - Key pair every request is signed with
    /// * `request` - What to generate
    /// * `cancel` - Stops the submission or polling loop when triggered
    pub async fn generate(
        &self,
        credentials: &Credentials,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> Outcome {
        generate(self, credentials, request, cancel).await
    }

    /// Generate one image and download it
    ///
    /// A failed download is reported as a gateway failure.
    pub async fn generate_bytes(
        &self,
        credentials: &Credentials,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> Outcome {
        let result = match run(self, credentials, request, PollPolicy::default(), cancel).await {
            Ok(GeneratedImage::Url(url)) => {
                debug!("Downloading {}", url);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ClientError::Cancelled),
                    bytes = self.download(&url) => bytes.map(GeneratedImage::Bytes),
                }
            }
            other => other,
        };
        extractor::into_outcome(result)
    }
}
