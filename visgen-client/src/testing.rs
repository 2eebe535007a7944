//! Scripted [`TaskApi`] used by the poller and orchestration tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::time::Instant;
use visgen_core::domain::credentials::Credentials;
use visgen_core::dto::generate::GenerateRequest;
use visgen_core::dto::task::TaskResultData;

use crate::error::{ClientError, Result};
use crate::tasks::TaskApi;

pub(crate) const TASK_ID: &str = "task-1";

pub(crate) fn status(token: &str) -> TaskResultData {
    TaskResultData {
        status: Some(token.to_string()),
        image_urls: None,
    }
}

pub(crate) fn done_with(urls: &[&str]) -> TaskResultData {
    TaskResultData {
        status: Some("done".to_string()),
        image_urls: Some(urls.iter().map(|u| u.to_string()).collect()),
    }
}

/// Replays result responses in order, then repeats `fallback` forever
pub(crate) struct ScriptedApi {
    submit_error: Mutex<Option<ClientError>>,
    script: Mutex<VecDeque<Result<TaskResultData>>>,
    fallback: TaskResultData,
    submits: AtomicU32,
    polls: AtomicU32,
    poll_times: Mutex<Vec<Instant>>,
}

impl ScriptedApi {
    pub(crate) fn new(script: Vec<Result<TaskResultData>>, fallback: TaskResultData) -> Self {
        Self {
            submit_error: Mutex::new(None),
            script: Mutex::new(script.into()),
            fallback,
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            poll_times: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_submit(err: ClientError) -> Self {
        let api = Self::new(vec![], status("running"));
        *api.submit_error.lock().unwrap() = Some(err);
        api
    }

    pub(crate) fn submits(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub(crate) fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn submit_task(&self, _credentials: &Credentials, _request: &GenerateRequest) -> Result<String> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        match self.submit_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(TASK_ID.to_string()),
        }
    }

    async fn get_result(&self, _credentials: &Credentials, task_id: &str) -> Result<TaskResultData> {
        assert_eq!(task_id, TASK_ID);
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll_times.lock().unwrap().push(Instant::now());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
