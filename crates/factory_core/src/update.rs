use crate::state::SnapshotOutcome;
use crate::{Effect, Msg, SurfacedError, TaskMachine, TaskPhase};

/// Pure update function: applies a message to the machine and returns any effects.
pub fn update(mut machine: TaskMachine, msg: Msg) -> (TaskMachine, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested => {
            // One task at a time: a submit outside Idle is refused without touching state.
            if *machine.phase() != TaskPhase::Idle {
                return (machine, Vec::new());
            }
            let submission = machine.begin_submission();
            vec![Effect::Upload { submission }]
        }
        Msg::SubmitSucceeded {
            submission,
            task_id,
            accepted_at,
        } => {
            if !machine.is_current_submission(submission) {
                return (machine, Vec::new());
            }
            machine.activate(task_id.clone(), accepted_at);
            vec![Effect::StartPolling { task_id }]
        }
        Msg::SubmitFailed { submission, error } => {
            if machine.is_current_submission(submission) {
                machine.fail_submission(SurfacedError::Upload(error));
            }
            Vec::new()
        }
        Msg::PollSucceeded { task_id, snapshot } => {
            match machine.apply_snapshot(&task_id, snapshot) {
                SnapshotOutcome::Terminal => vec![Effect::StopPolling { task_id }],
                SnapshotOutcome::Updated | SnapshotOutcome::Ignored => Vec::new(),
            }
        }
        // Transient failures never move the machine.
        Msg::PollFailed { .. } => Vec::new(),
        Msg::ResetRequested => match machine.reset() {
            Some(task_id) => vec![Effect::StopPolling { task_id }],
            None => Vec::new(),
        },
        Msg::ShutdownRequested => match machine.cancel() {
            Some(task_id) => vec![Effect::StopPolling { task_id }],
            None => Vec::new(),
        },
    };

    (machine, effects)
}
