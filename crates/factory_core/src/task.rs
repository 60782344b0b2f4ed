use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::ArtifactKind;

/// Opaque identifier the backend assigns to one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local sequence number for submit attempts; never sent to the backend.
pub type SubmissionId = u64;

/// Server-reported lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Position in the lifecycle. Both terminal states share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status '{0}'")]
pub struct UnknownTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownTaskStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(UnknownTaskStatus(other.to_string())),
        }
    }
}

/// One submitted generation job as tracked locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Latest full log reported by the backend; replaced on every applied poll.
    pub logs: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            logs: Vec::new(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    /// Normalizes to upper case; anything unrecognized is kept verbatim as `Other`.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(name) => name,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated endpoint as listed in the backend preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub ref_id: String,
    pub method: HttpMethod,
    pub name: String,
    /// Relative path, e.g. `/v1/users/{id}`.
    pub url: String,
}

/// Validated result of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: TaskStatus,
    pub logs: Vec<String>,
    pub artifacts_ready: Vec<ArtifactKind>,
    pub preview: Vec<PreviewEntry>,
}

impl StatusSnapshot {
    /// Snapshot with only a status and logs, as reported while work is ongoing.
    pub fn in_progress(status: TaskStatus, logs: Vec<String>) -> Self {
        Self {
            status,
            logs,
            artifacts_ready: Vec::new(),
            preview: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpMethod, TaskStatus};

    #[test]
    fn status_rank_orders_lifecycle() {
        assert!(TaskStatus::Pending.rank() < TaskStatus::Processing.rank());
        assert!(TaskStatus::Processing.rank() < TaskStatus::Completed.rank());
        assert_eq!(TaskStatus::Completed.rank(), TaskStatus::Failed.rank());
    }

    #[test]
    fn status_parses_wire_names_only() {
        assert_eq!("processing".parse::<TaskStatus>(), Ok(TaskStatus::Processing));
        assert!("Processing".parse::<TaskStatus>().is_err());
        assert!("queued".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn method_is_normalized() {
        assert_eq!(HttpMethod::parse(" get "), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("purge"), HttpMethod::Other("PURGE".into()));
        assert_eq!(HttpMethod::parse("purge").as_str(), "PURGE");
    }
}
