use std::fmt;

use crate::{ArtifactKind, PreviewEntry, TaskId, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseLabel {
    #[default]
    Idle,
    Submitting,
    Active,
    Succeeded,
    Failed,
}

impl PhaseLabel {
    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseLabel::Succeeded | PhaseLabel::Failed)
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseLabel::Idle => "idle",
            PhaseLabel::Submitting => "submitting",
            PhaseLabel::Active => "active",
            PhaseLabel::Succeeded => "succeeded",
            PhaseLabel::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Everything the presentation layer needs to draw the current task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskView {
    pub phase: PhaseLabel,
    pub task_id: Option<TaskId>,
    pub status: Option<TaskStatus>,
    pub logs: Vec<String>,
    pub error: Option<String>,
    pub preview: Vec<PreviewEntry>,
    pub artifacts: Vec<ArtifactKind>,
}
