#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use factory_core::{
    ArtifactKind, HttpMethod, PollError, PreviewEntry, StatusSnapshot, TaskId, TaskStatus,
    UploadError,
};
use factory_engine::{PollVerdict, SnapshotSink, Transport, UploadSelection};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(factory_logging::initialize_for_tests);
}

pub fn logs(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

pub fn processing(lines: &[&str]) -> StatusSnapshot {
    StatusSnapshot::in_progress(TaskStatus::Processing, logs(lines))
}

pub fn failed(lines: &[&str]) -> StatusSnapshot {
    StatusSnapshot::in_progress(TaskStatus::Failed, logs(lines))
}

pub fn completed_with_get_user() -> StatusSnapshot {
    StatusSnapshot {
        status: TaskStatus::Completed,
        logs: logs(&["Parsing sheet 1", "Done"]),
        artifacts_ready: vec![ArtifactKind::RequestCollection, ArtifactKind::TestSuite],
        preview: vec![PreviewEntry {
            ref_id: "1".to_string(),
            method: HttpMethod::Get,
            name: "GetUser".to_string(),
            url: "/v1/users/{id}".to_string(),
        }],
    }
}

pub fn sheet() -> UploadSelection {
    UploadSelection::new("api_spec.xlsx", b"PK\x03\x04".to_vec())
}

/// In-memory transport that replays scripted results.
///
/// Once the poll script runs out, every poll reports `processing` with no logs.
/// Submits without a scripted result succeed with `task-1`, `task-2`, ...
pub struct ScriptedTransport {
    submit_script: Mutex<VecDeque<Result<TaskId, UploadError>>>,
    poll_script: Mutex<VecDeque<Result<StatusSnapshot, PollError>>>,
    poll_delay: Duration,
    submits: AtomicUsize,
    polls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    polled_ids: Mutex<Vec<TaskId>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            submit_script: Mutex::new(VecDeque::new()),
            poll_script: Mutex::new(VecDeque::new()),
            poll_delay: Duration::ZERO,
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            polled_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn then_submit(self, result: Result<TaskId, UploadError>) -> Self {
        self.submit_script.lock().unwrap().push_back(result);
        self
    }

    pub fn then_poll(self, result: Result<StatusSnapshot, PollError>) -> Self {
        self.poll_script.lock().unwrap().push_back(result);
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn polled_ids(&self) -> Vec<TaskId> {
        self.polled_ids.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn submit(&self, _upload: &UploadSelection) -> Result<TaskId, UploadError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.submit_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(TaskId::new(format!("task-{n}"))))
    }

    async fn poll(&self, task_id: &TaskId) -> Result<StatusSnapshot, PollError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.polled_ids.lock().unwrap().push(task_id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.poll_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(processing(&[])))
    }
}

/// Sink that records every delivery and stops on terminal snapshots.
#[derive(Default)]
pub struct RecordingSink {
    results: Mutex<Vec<Result<StatusSnapshot, PollError>>>,
}

impl RecordingSink {
    pub fn results(&self) -> Vec<Result<StatusSnapshot, PollError>> {
        self.results.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

impl SnapshotSink for RecordingSink {
    fn deliver(&self, _task_id: &TaskId, result: Result<StatusSnapshot, PollError>) -> PollVerdict {
        let terminal = matches!(&result, Ok(snapshot) if snapshot.status.is_terminal());
        self.results.lock().unwrap().push(result);
        if terminal {
            PollVerdict::Stop
        } else {
            PollVerdict::Continue
        }
    }
}
