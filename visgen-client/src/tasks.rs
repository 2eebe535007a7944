//! Task-related API endpoints

use async_trait::async_trait;
use tracing::{debug, info};
use visgen_core::domain::credentials::Credentials;
use visgen_core::dto::generate::GenerateRequest;
use visgen_core::dto::task::{GetResultBody, SubmitTaskBody, SubmitTaskData, TaskResultData};

use crate::{VisualClient, decode_envelope, decode_result_envelope};
use crate::config::{GET_RESULT_ACTION, SUBMIT_ACTION};
use crate::error::{ClientError, Result};

/// The two provider calls the job lifecycle is built on
///
/// Implemented by [`VisualClient`]; the poller and [`crate::generate`] only
/// depend on this trait so they can be driven by scripted responses.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create a generation task, returning the provider's task id
    async fn submit_task(&self, credentials: &Credentials, request: &GenerateRequest) -> Result<String>;

    /// Query the current state of a task
    async fn get_result(&self, credentials: &Credentials, task_id: &str) -> Result<TaskResultData>;
}

impl VisualClient {
    // =============================================================================
    // Task Lifecycle
    // =============================================================================

    /// Submit a new generation task
    ///
    /// Issues exactly one request; a failed submission is never retried.
    ///
    /// # Arguments
    /// * `credentials` - Key pair used to sign the request
    /// * `request` - Prompt, optional reference image and output size
    ///
    /// # Returns
    /// The opaque task id assigned by the provider
    ///
    /// # Example
    /// ```no_run
    /// # use visgen_client::{ClientConfig, VisualClient};
    /// # use visgen_core::domain::credentials::Credentials;
    /// # use visgen_core::dto::generate::GenerateRequest;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = VisualClient::new(ClientConfig::default())?;
    /// let task_id = client
    ///     .submit_task(&Credentials::new("AKLT...", "secret"), &GenerateRequest::new("a red cube"))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_task(&self, credentials: &Credentials, request: &GenerateRequest) -> Result<String> {
        request.validate().map_err(ClientError::InvalidRequest)?;

        let body = SubmitTaskBody::from_request(&self.config.req_key, request);
        let payload = serde_json::to_vec(&body)
            .map_err(|e| ClientError::InvalidRequest(format!("failed to encode request: {}", e)))?;

        info!(
            "Submitting task (req_key {}, {}x{}, reference: {})",
            body.req_key,
            body.width,
            body.height,
            !body.image_urls.is_empty()
        );

        let data: SubmitTaskData = self
            .post_signed(credentials, SUBMIT_ACTION, payload, decode_envelope)
            .await?;

        if data.task_id.trim().is_empty() {
            return Err(ClientError::ParseError("provider returned an empty task id".to_string()));
        }

        info!("Task submitted: {}", data.task_id);
        Ok(data.task_id)
    }

    /// Query a task's status and outputs
    ///
    /// Signed afresh on every call.
    ///
    /// # Arguments
    /// * `credentials` - Key pair used to sign the request
    /// * `task_id` - Id returned by [`VisualClient::submit_task`]
    pub async fn get_result(&self, credentials: &Credentials, task_id: &str) -> Result<TaskResultData> {
        let body = GetResultBody::new(&self.config.req_key, task_id);
        let payload = serde_json::to_vec(&body)
            .map_err(|e| ClientError::InvalidRequest(format!("failed to encode request: {}", e)))?;

        let data = self
            .post_signed(credentials, GET_RESULT_ACTION, payload, decode_result_envelope)
            .await?;

        debug!("Task {} status: {:?}", task_id, data.status);
        Ok(data)
    }

    // =============================================================================
    // Outputs
    // =============================================================================

    /// Download a generated image
    ///
    /// Output URLs are pre-signed by the provider, so this is a plain GET.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::gateway(status.as_u16(), &error_text));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes from output URL", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TaskApi for VisualClient {
    async fn submit_task(&self, credentials: &Credentials, request: &GenerateRequest) -> Result<String> {
        VisualClient::submit_task(self, credentials, request).await
    }

    async fn get_result(&self, credentials: &Credentials, task_id: &str) -> Result<TaskResultData> {
        VisualClient::get_result(self, credentials, task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::signer::{self, RequestToSign};
    use chrono::NaiveDateTime;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use sha2::{Digest, Sha256};
    use std::sync::{Arc, Mutex};
    use tokio::time::Duration;
    use visgen_core::domain::job::JobStatus;

    fn credentials() -> Credentials {
        Credentials::new("AKLTexample", "secretExample==")
    }

    fn client_for(server: &Server) -> VisualClient {
        // Requests go to the mock server, signatures stay scoped to the provider host
        VisualClient::new(ClientConfig::default().with_endpoint(format!("{}/api/jimeng", server.url())))
            .unwrap()
    }

    fn signed_call(server: &mut Server, action: &str) -> mockito::Mock {
        server
            .mock("POST", Matcher::Regex(r"^/api/jimeng".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".into(), action.into()),
                Matcher::UrlEncoded("Version".into(), "2022-08-31".into()),
            ]))
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^HMAC-SHA256 Credential=AKLTexample/\d{8}/cn-north-1/cv/request, SignedHeaders=content-type;host;x-date, Signature=[0-9a-f]{64}$"
                        .to_string(),
                ),
            )
            .match_header("x-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".to_string()))
            .match_header("content-type", "application/json")
    }

    #[tokio::test]
    async fn test_submit_task_returns_task_id() {
        let mut server = Server::new_async().await;
        let mock = signed_call(&mut server, SUBMIT_ACTION)
            .match_body(Matcher::PartialJson(json!({
                "req_key": "jimeng_t2i_v40",
                "prompt": "a red cube",
                "image_urls": ["https://img.example.com/ref.png"],
                "scale": 0.3,
                "width": 2048,
                "height": 2048
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":10000,"message":"Success","data":{"task_id":"7392616336519610409"}}"#)
            .expect(1)
            .create_async()
            .await;

        let request = GenerateRequest::new("a red cube").with_reference("https://img.example.com/ref.png", 0.3);
        let task_id = client_for(&server).submit_task(&credentials(), &request).await.unwrap();

        assert_eq!(task_id, "7392616336519610409");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_task_html_404_is_gateway_error() {
        let mut server = Server::new_async().await;
        let body = format!(
            "<!DOCTYPE html><html><head><title>Page Not Found</title></head><body>{}</body></html>",
            "<p>Looks like you've followed a broken link or entered a URL that doesn't exist.</p>".repeat(3)
        );
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(404)
            .with_header("content-type", "text/html; charset=UTF-8")
            .with_body(body)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_task(&credentials(), &GenerateRequest::new("a red cube"))
            .await
            .unwrap_err();

        match &err {
            ClientError::Gateway { status, snippet } => {
                assert_eq!(*status, 404);
                assert!(snippet.chars().count() <= 100);
                assert!(!snippet.contains('<') && !snippet.contains('>'));
                assert!(snippet.starts_with("Page Not Found"));
            }
            other => panic!("expected gateway error, got {:?}", other),
        }
        assert!(err.is_not_found());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_task_rejected_by_provider() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":50411,"message":"Pre Img Risk Not Pass","data":null}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_task(&credentials(), &GenerateRequest::new("a red cube"))
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            ClientError::RejectedByProvider { code: Some(50411), message } if message == "Pre Img Risk Not Pass"
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_task_without_secret_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let err = client_for(&server)
            .submit_task(&Credentials::new("AKLTexample", ""), &GenerateRequest::new("a red cube"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Authentication(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_task_validates_before_sending() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let request = GenerateRequest::new("a red cube").with_reference("https://img.example.com/ref.png", 2.0);
        let err = client_for(&server).submit_task(&credentials(), &request).await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_result_sends_task_id() {
        let mut server = Server::new_async().await;
        let mock = signed_call(&mut server, GET_RESULT_ACTION)
            .match_body(Matcher::Json(json!({
                "req_key": "jimeng_t2i_v40",
                "task_id": "task-1",
                "req_json": "{\"return_url\":true}"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":10000,"data":{"status":"done","image_urls":["https://out.example.com/1.png"]}}"#)
            .expect(1)
            .create_async()
            .await;

        let data = client_for(&server).get_result(&credentials(), "task-1").await.unwrap();

        assert_eq!(data.first_image_url(), Some("https://out.example.com/1.png"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_result_failing_code_with_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":50500,"message":"Task Not Found","data":{"status":"not_found"}}"#)
            .create_async()
            .await;

        let data = client_for(&server).get_result(&credentials(), "task-1").await.unwrap();
        assert_eq!(data.job_status(), Some(JobStatus::NotFound));
    }

    #[tokio::test]
    async fn test_each_result_query_is_signed_over_its_own_body() {
        let mut server = Server::new_async().await;
        let seen: Arc<Mutex<Vec<(String, String, Vec<u8>)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |req| {
                let header = |name: &str| {
                    req.header(name)
                        .first()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                let body = req.body().map(|b| b.to_vec()).unwrap_or_default();
                sink.lock()
                    .unwrap()
                    .push((header("x-date"), header("authorization"), body));
                br#"{"code":10000,"data":{"status":"running"}}"#.to_vec()
            })
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let creds = credentials();
        client.get_result(&creds, "task-1").await.unwrap();
        // X-Date has one-second resolution
        tokio::time::sleep(Duration::from_millis(1100)).await;
        client.get_result(&creds, "task-1").await.unwrap();
        mock.assert_async().await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0].0, seen[1].0);
        assert_ne!(seen[0].1, seen[1].1);

        for (x_date, authorization, body) in &seen {
            let body_hash = hex::encode(Sha256::digest(body));
            let at = NaiveDateTime::parse_from_str(x_date, "%Y%m%dT%H%M%SZ")
                .unwrap()
                .and_utc();
            let expected = signer::sign(
                &creds,
                &client.config().signing_scope(),
                RequestToSign {
                    method: "POST",
                    query: &[],
                    action: GET_RESULT_ACTION,
                    version: "2022-08-31",
                    body,
                },
                at,
            )
            .unwrap();

            assert_eq!(expected.payload_hash, body_hash);
            assert!(expected.canonical_request.ends_with(&body_hash));
            assert_eq!(&expected.authorization, authorization);
        }
    }

    #[tokio::test]
    async fn test_get_result_server_error_is_gateway() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client_for(&server).get_result(&credentials(), "task-1").await.unwrap_err();
        assert!(matches!(err, ClientError::Gateway { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_download() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/out.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89u8, b'P', b'N', b'G'])
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/gone.png")
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code></Error>")
            .create_async()
            .await;

        let client = client_for(&server);
        let bytes = client.download(&format!("{}/out.png", server.url())).await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

        let err = client.download(&format!("{}/gone.png", server.url())).await.unwrap_err();
        assert!(matches!(err, ClientError::Gateway { status: 403, ref snippet } if snippet == "AccessDenied"));
    }
}
