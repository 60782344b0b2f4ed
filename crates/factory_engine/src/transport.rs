use factory_core::{api_url, PollError, StatusSnapshot, TaskId, UploadError};
use factory_logging::{factory_debug, factory_info};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use url::Url;

use crate::upload::{UploadSelection, XLSX_MIME};
use crate::wire::{decode_error_detail, decode_snapshot, decode_submit_response};
use crate::ClientSettings;

/// The two calls the orchestrator makes against the generation service.
///
/// Implementations do not retry and do not cache; policy lives in the
/// scheduler.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, upload: &UploadSelection) -> Result<TaskId, UploadError>;

    async fn poll(&self, task_id: &TaskId) -> Result<StatusSnapshot, PollError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        api_url(&self.base_url, segments)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn submit(&self, upload: &UploadSelection) -> Result<TaskId, UploadError> {
        let url = self
            .endpoint(&["api", "upload"])
            .ok_or_else(|| UploadError::network("base url cannot carry a path"))?;

        let part = Part::bytes(upload.content.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(XLSX_MIME)
            .map_err(|err| UploadError::network(err.to_string()))?;
        let form = Form::new().part("file", part);

        factory_info!(
            "Uploading file={} bytes={} to {}",
            upload.file_name,
            upload.content.len(),
            url
        );
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::network(describe(&err)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::network(describe(&err)))?;

        if status.is_success() {
            let task_id = decode_submit_response(&body)?;
            factory_info!("Upload accepted task_id={}", task_id);
            return Ok(task_id);
        }

        let detail = decode_error_detail(&body).unwrap_or_else(|| status_text(status));
        factory_info!("Upload rejected status={} detail={}", status.as_u16(), detail);
        Err(UploadError::rejected(status.as_u16(), detail))
    }

    async fn poll(&self, task_id: &TaskId) -> Result<StatusSnapshot, PollError> {
        let url = self
            .endpoint(&["api", "status", task_id.as_str()])
            .ok_or_else(|| PollError::transient("base url cannot carry a path"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PollError::transient(describe(&err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::transient(format!(
                "status query returned {}",
                status_text(status)
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PollError::transient(describe(&err)))?;
        let snapshot = decode_snapshot(&body)?;
        factory_debug!(
            "Polled task_id={} status={} log_lines={}",
            task_id,
            snapshot.status,
            snapshot.logs.len()
        );
        Ok(snapshot)
    }
}

pub(crate) fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

pub(crate) fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return format!("timeout: {err}");
    }
    if err.is_connect() {
        return format!("connection failed: {err}");
    }
    err.to_string()
}
