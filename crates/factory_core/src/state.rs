use chrono::{DateTime, Utc};

use crate::view_model::{PhaseLabel, TaskView};
use crate::{
    ArtifactRegistry, ProcessingFailure, StatusSnapshot, SubmissionId, SurfacedError, Task,
    TaskId, TaskStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    Submitting {
        submission: SubmissionId,
    },
    Active(Task),
    Succeeded {
        task: Task,
        registry: ArtifactRegistry,
    },
    Failed {
        task: Task,
        reason: ProcessingFailure,
    },
}

/// What applying a snapshot did to an active task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotOutcome {
    /// Not for the active task, or would move the status backwards.
    Ignored,
    Updated,
    Terminal,
}

/// Lifecycle of at most one task. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskMachine {
    phase: TaskPhase,
    last_error: Option<SurfacedError>,
    last_submission: SubmissionId,
    dirty: bool,
}

impl TaskMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TaskPhase {
        &self.phase
    }

    pub fn last_error(&self) -> Option<&SurfacedError> {
        self.last_error.as_ref()
    }

    pub fn task(&self) -> Option<&Task> {
        match &self.phase {
            TaskPhase::Active(task)
            | TaskPhase::Succeeded { task, .. }
            | TaskPhase::Failed { task, .. } => Some(task),
            TaskPhase::Idle | TaskPhase::Submitting { .. } => None,
        }
    }

    /// Non-empty only in the succeeded phase.
    pub fn registry(&self) -> Option<&ArtifactRegistry> {
        match &self.phase {
            TaskPhase::Succeeded { registry, .. } => Some(registry),
            _ => None,
        }
    }

    pub fn active_task_id(&self) -> Option<&TaskId> {
        match &self.phase {
            TaskPhase::Active(task) => Some(&task.id),
            _ => None,
        }
    }

    pub fn view(&self) -> TaskView {
        let label = match &self.phase {
            TaskPhase::Idle => PhaseLabel::Idle,
            TaskPhase::Submitting { .. } => PhaseLabel::Submitting,
            TaskPhase::Active(_) => PhaseLabel::Active,
            TaskPhase::Succeeded { .. } => PhaseLabel::Succeeded,
            TaskPhase::Failed { .. } => PhaseLabel::Failed,
        };
        let task = self.task();
        let registry = self.registry();
        TaskView {
            phase: label,
            task_id: task.map(|t| t.id.clone()),
            status: task.map(|t| t.status),
            logs: task.map(|t| t.logs.clone()).unwrap_or_default(),
            error: self.last_error.as_ref().map(ToString::to_string),
            preview: registry.map(|r| r.preview().to_vec()).unwrap_or_default(),
            artifacts: registry.map(|r| r.kinds().collect()).unwrap_or_default(),
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_current_submission(&self, submission: SubmissionId) -> bool {
        matches!(self.phase, TaskPhase::Submitting { submission: current } if current == submission)
    }

    pub(crate) fn begin_submission(&mut self) -> SubmissionId {
        self.last_submission += 1;
        let submission = self.last_submission;
        self.phase = TaskPhase::Submitting { submission };
        self.last_error = None;
        self.mark_dirty();
        submission
    }

    pub(crate) fn activate(&mut self, task_id: TaskId, accepted_at: DateTime<Utc>) {
        self.phase = TaskPhase::Active(Task::new(task_id, accepted_at));
        self.mark_dirty();
    }

    pub(crate) fn fail_submission(&mut self, error: SurfacedError) {
        self.phase = TaskPhase::Idle;
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn apply_snapshot(
        &mut self,
        task_id: &TaskId,
        snapshot: StatusSnapshot,
    ) -> SnapshotOutcome {
        let TaskPhase::Active(task) = &mut self.phase else {
            return SnapshotOutcome::Ignored;
        };
        if &task.id != task_id || snapshot.status.rank() < task.status.rank() {
            return SnapshotOutcome::Ignored;
        }

        task.status = snapshot.status;
        task.logs = snapshot.logs;
        let task = task.clone();
        let outcome = match snapshot.status {
            TaskStatus::Pending | TaskStatus::Processing => SnapshotOutcome::Updated,
            TaskStatus::Completed => {
                let registry = ArtifactRegistry::new(
                    task.id.clone(),
                    snapshot.artifacts_ready,
                    snapshot.preview,
                );
                self.phase = TaskPhase::Succeeded { task, registry };
                SnapshotOutcome::Terminal
            }
            TaskStatus::Failed => {
                self.phase = TaskPhase::Failed {
                    task,
                    reason: ProcessingFailure,
                };
                self.last_error = Some(SurfacedError::Processing(ProcessingFailure));
                SnapshotOutcome::Terminal
            }
        };
        self.mark_dirty();
        outcome
    }

    /// Discards the task (if any) and any surfaced error. Returns the task id
    /// that was still being polled, if there was one.
    pub(crate) fn reset(&mut self) -> Option<TaskId> {
        let polling = self.active_task_id().cloned();
        let changed = self.phase != TaskPhase::Idle || self.last_error.is_some();
        self.phase = TaskPhase::Idle;
        self.last_error = None;
        if changed {
            self.mark_dirty();
        }
        polling
    }

    /// Abandons a task that has not finished (submitting or active); a
    /// finished task keeps its results. Returns the task id that was being
    /// polled, if there was one.
    pub(crate) fn cancel(&mut self) -> Option<TaskId> {
        if matches!(self.phase, TaskPhase::Submitting { .. } | TaskPhase::Active(_)) {
            self.reset()
        } else {
            None
        }
    }
}
