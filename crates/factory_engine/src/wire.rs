//! JSON bodies exchanged with the generation service.
//!
//! Decoding is strict: every documented field must be present and every
//! enumerated string must be known. Anything else is a decoding failure rather
//! than a best-effort guess.

use factory_core::{
    ArtifactKind, HttpMethod, PollError, PreviewEntry, StatusSnapshot, TaskId, TaskStatus,
    UploadError,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    logs: Vec<String>,
    artifacts_ready: Vec<String>,
    api_preview: Vec<PreviewRow>,
}

#[derive(Debug, Deserialize)]
struct PreviewRow {
    ref_id: String,
    method: String,
    name: String,
    url: String,
}

/// Decodes a 2xx upload body into the assigned task id.
pub fn decode_submit_response(body: &[u8]) -> Result<TaskId, UploadError> {
    let response: SubmitResponse = serde_json::from_slice(body)
        .map_err(|err| UploadError::network(format!("malformed upload response: {err}")))?;
    let task_id = response.task_id.trim();
    if task_id.is_empty() {
        return Err(UploadError::network("upload response carried an empty task id"));
    }
    Ok(TaskId::new(task_id))
}

/// Extracts the human-readable `detail` of an error body, if there is one.
///
/// Structured details (lists of validation errors) are rendered as compact JSON.
pub(crate) fn decode_error_detail(body: &[u8]) -> Option<String> {
    let response: ErrorResponse = serde_json::from_slice(body).ok()?;
    let detail = match response.detail {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    let detail = detail.trim();
    (!detail.is_empty()).then(|| detail.to_string())
}

/// Decodes a status body into a validated snapshot.
pub fn decode_snapshot(body: &[u8]) -> Result<StatusSnapshot, PollError> {
    let response: StatusResponse = serde_json::from_slice(body)
        .map_err(|err| PollError::transient(format!("malformed status response: {err}")))?;

    let status: TaskStatus = response
        .status
        .parse()
        .map_err(|err| PollError::transient(format!("{err}")))?;

    let artifacts_ready = response
        .artifacts_ready
        .iter()
        .map(|name| name.parse::<ArtifactKind>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| PollError::transient(format!("{err}")))?;

    let preview = response
        .api_preview
        .into_iter()
        .map(|row| PreviewEntry {
            ref_id: row.ref_id,
            method: HttpMethod::parse(&row.method),
            name: row.name,
            url: row.url,
        })
        .collect();

    Ok(StatusSnapshot {
        status,
        logs: response.logs,
        artifacts_ready,
        preview,
    })
}
