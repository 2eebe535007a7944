//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation job tracked between submission and its terminal outcome
///
/// Created once the provider accepts a task, updated only by the poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Number of result queries issued so far (1-based once polling starts)
    pub attempt: u32,
}

impl Job {
    /// A freshly submitted job, not yet polled
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            attempt: 0,
        }
    }
}

/// Task status as reported by the provider
///
/// Wire tokens are lower-case and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
    NotFound,
    Expired,
}

impl JobStatus {
    /// Parse a provider status token, `None` for anything unrecognised
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "not_found" => Some(Self::NotFound),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
        }
    }

    /// Done or Failed: the provider will not change its answer
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// NotFound and Expired share one handling path
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound | Self::Expired)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip_through_serde() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Done,
            JobStatus::Failed,
            JobStatus::NotFound,
            JobStatus::Expired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(JobStatus::from_token(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert_eq!(JobStatus::from_token("DONE"), None);
        assert_eq!(JobStatus::from_token("Not_Found"), None);
        assert_eq!(JobStatus::from_token("in_queue"), None);
    }

    #[test]
    fn test_submitted_job_starts_queued() {
        let job = Job::submitted("task-1");
        assert_eq!(job.id, "task-1");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempt, 0);
    }

    #[test]
    fn test_status_groups() {
        assert!(JobStatus::Done.is_finished());
        assert!(JobStatus::Failed.is_finished());
        assert!(!JobStatus::Running.is_finished());
        assert!(JobStatus::NotFound.is_missing());
        assert!(JobStatus::Expired.is_missing());
        assert!(!JobStatus::Queued.is_missing());
    }
}
