//! Job poller
//!
//! Queries a submitted task at a fixed interval until the provider reports a
//! terminal state, the attempt cap is reached, or the caller cancels.
//! Each attempt is a freshly signed request; the interval never adapts.

use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use visgen_core::domain::credentials::Credentials;
use visgen_core::domain::job::Job;
use visgen_core::dto::task::TaskResultData;

use crate::error::{ClientError, Result};
use crate::tasks::TaskApi;

/// Delay before every result query
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Result queries issued before giving up (about two minutes)
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Attempts during which not_found/expired means "not visible yet"
pub const NOT_FOUND_GRACE_ATTEMPTS: u32 = 5;

/// Polling limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub grace_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
            grace_attempts: NOT_FOUND_GRACE_ATTEMPTS,
        }
    }
}

/// What one status reading means for the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Wait,
    Finished,
}

/// Drives one job from submitted to a terminal provider response
pub struct JobPoller<'a> {
    api: &'a dyn TaskApi,
    credentials: &'a Credentials,
    policy: PollPolicy,
}

impl<'a> JobPoller<'a> {
    /// Creates a poller with the default policy
    pub fn new(api: &'a dyn TaskApi, credentials: &'a Credentials) -> Self {
        Self {
            api,
            credentials,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Polls until the task is done or failed
    ///
    /// Returns the terminal response for the extractor. Transport, gateway
    /// and provider errors end polling immediately; only not_found/expired
    /// within the grace window and in-progress states keep it going.
    pub async fn run(&self, job: &mut Job, cancel: &CancellationToken) -> Result<TaskResultData> {
        info!(
            "Polling task {} (interval: {:?}, max attempts: {})",
            job.id, self.policy.interval, self.policy.max_attempts
        );

        while job.attempt < self.policy.max_attempts {
            self.wait(cancel).await?;

            job.attempt += 1;

            let data = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                result = self.api.get_result(self.credentials, &job.id) => result?,
            };

            if self.observe(job, &data)? == Step::Finished {
                info!(
                    "Task {} reached '{}' after {} attempt(s)",
                    job.id, job.status, job.attempt
                );
                return Ok(data);
            }
        }

        warn!(
            "Task {} still '{}' after {} attempts, giving up",
            job.id, job.status, job.attempt
        );
        Err(ClientError::Timeout {
            attempts: job.attempt,
        })
    }

    /// Sleeps one interval unless cancelled first
    ///
    /// The timer is owned by this future, so it is dropped on either branch.
    async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Polling cancelled");
                Err(ClientError::Cancelled)
            }
            _ = time::sleep(self.policy.interval) => Ok(()),
        }
    }

    /// Applies one status reading to the job
    fn observe(&self, job: &mut Job, data: &TaskResultData) -> Result<Step> {
        let Some(status) = data.job_status() else {
            warn!(
                "Task {} attempt {}: unrecognised status {:?}, still waiting",
                job.id, job.attempt, data.status
            );
            return Ok(Step::Wait);
        };

        job.status = status;
        debug!("Task {} attempt {}: {}", job.id, job.attempt, status);

        if status.is_finished() {
            return Ok(Step::Finished);
        }

        if status.is_missing() {
            if job.attempt > self.policy.grace_attempts {
                warn!(
                    "Task {} still '{}' at attempt {}, past the grace window",
                    job.id, status, job.attempt
                );
                return Err(ClientError::Expired { status });
            }
            debug!("Task {} not visible yet", job.id);
        }

        Ok(Step::Wait)
    }
}
