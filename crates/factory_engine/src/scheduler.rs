//! Periodic status polling for one active task.
//!
//! Polls are awaited inside the loop, so at most one is outstanding; ticks
//! that elapse while a poll is in flight are skipped. Stopping is synchronous
//! (token cancellation) and a result that lands after cancellation is dropped.

use std::sync::Arc;
use std::time::Duration;

use factory_core::{PollError, StatusSnapshot, TaskId};
use factory_logging::{factory_debug, factory_info, factory_warn};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::Transport;

/// Whether the poll loop should keep going after a delivered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    Continue,
    Stop,
}

/// Receives every poll result that was not cancelled.
pub trait SnapshotSink: Send + Sync {
    fn deliver(&self, task_id: &TaskId, result: Result<StatusSnapshot, PollError>) -> PollVerdict;
}

#[derive(Clone)]
pub struct PollingScheduler {
    transport: Arc<dyn Transport>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn new(transport: Arc<dyn Transport>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
        }
    }

    /// Spawns the poll loop for `task_id`. The first poll fires one interval
    /// from now. Must be called inside a tokio runtime.
    pub fn start(&self, task_id: TaskId, sink: Arc<dyn SnapshotSink>) -> PollHandle {
        let token = CancellationToken::new();
        factory_info!(
            "Polling started task_id={} interval_ms={}",
            task_id,
            self.interval.as_millis()
        );
        let join = tokio::spawn(run_poll_loop(
            task_id.clone(),
            self.transport.clone(),
            sink,
            self.interval,
            token.clone(),
        ));
        PollHandle {
            task_id,
            token,
            join: Some(join),
        }
    }
}

/// Owned poll timer. Dropping the handle stops polling.
#[derive(Debug)]
pub struct PollHandle {
    task_id: TaskId,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Cancels the loop. A poll still in flight is abandoned and its result dropped.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            factory_debug!("Polling stop requested task_id={}", self.task_id);
            self.token.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the loop and waits until its task has exited.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_poll_loop(
    task_id: TaskId,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn SnapshotSink>,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                factory_debug!("Abandoning in-flight poll task_id={}", task_id);
                break;
            }
            result = transport.poll(&task_id) => result,
        };
        if token.is_cancelled() {
            break;
        }

        match &result {
            Ok(_) => consecutive_failures = 0,
            Err(err) => {
                consecutive_failures += 1;
                factory_warn!(
                    "Poll failed task_id={} consecutive_failures={}: {}",
                    task_id,
                    consecutive_failures,
                    err
                );
            }
        }

        if sink.deliver(&task_id, result) == PollVerdict::Stop {
            break;
        }
    }

    factory_info!("Polling stopped task_id={}", task_id);
}
