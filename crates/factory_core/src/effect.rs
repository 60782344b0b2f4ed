use crate::{SubmissionId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the selected file; report back with the same submission id.
    Upload { submission: SubmissionId },
    /// Begin periodic status polls for a task that just became active.
    StartPolling { task_id: TaskId },
    /// Stop polling; no further poll for this task may be issued.
    StopPolling { task_id: TaskId },
}
