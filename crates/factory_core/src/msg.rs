use chrono::{DateTime, Utc};

use crate::{PollError, StatusSnapshot, SubmissionId, TaskId, UploadError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to submit the selected file.
    SubmitRequested,
    /// Backend accepted the upload and assigned a task id.
    SubmitSucceeded {
        submission: SubmissionId,
        task_id: TaskId,
        accepted_at: DateTime<Utc>,
    },
    /// Upload failed before a task existed.
    SubmitFailed {
        submission: SubmissionId,
        error: UploadError,
    },
    /// A status poll returned a validated snapshot.
    PollSucceeded {
        task_id: TaskId,
        snapshot: StatusSnapshot,
    },
    /// A status poll failed; tolerated.
    PollFailed { task_id: TaskId, error: PollError },
    /// User discarded the current task (or cancelled it).
    ResetRequested,
    /// The owner is tearing down; an unfinished task is abandoned.
    ShutdownRequested,
}
