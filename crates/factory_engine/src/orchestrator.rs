use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use factory_core::{
    update, ArtifactKind, Effect, Msg, PhaseLabel, PollError, StatusSnapshot, TaskId,
    TaskMachine, TaskView, UploadError,
};
use factory_logging::{factory_debug, factory_info, factory_warn};
use tokio::sync::watch;
use url::Url;

use crate::scheduler::{PollHandle, PollVerdict, PollingScheduler, SnapshotSink};
use crate::{ClientSettings, ReqwestTransport, Transport, UploadSelection};

/// Composition root: owns the task machine and the poller for its one task.
///
/// All state changes go through [`factory_core::update`] under a mutex that is
/// never held across an await. The poll loop reaches the machine only through
/// a weak reference, so dropping the orchestrator tears polling down.
pub struct Orchestrator {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    transport: Arc<dyn Transport>,
    scheduler: PollingScheduler,
    base_url: Url,
    view_tx: watch::Sender<TaskView>,
    me: Weak<Shared>,
}

#[derive(Default)]
struct Inner {
    machine: TaskMachine,
    poller: Option<PollHandle>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Self {
        let scheduler = PollingScheduler::new(transport.clone(), settings.poll_interval);
        let base_url = settings.base_url.clone();
        let (view_tx, _) = watch::channel(TaskView::default());
        let shared = Arc::new_cyclic(|me| Shared {
            inner: Mutex::new(Inner::default()),
            transport,
            scheduler,
            base_url,
            view_tx,
            me: me.clone(),
        });
        Self { shared }
    }

    /// Orchestrator backed by the reqwest transport.
    pub fn connect(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport), settings))
    }

    /// Uploads `upload` and, once the backend assigns a task id, starts polling.
    ///
    /// Refused with [`UploadError::Busy`] unless the machine is idle. A reset
    /// while the upload is in flight abandons it: the id is still returned but
    /// the task is not tracked.
    pub async fn submit(&self, upload: UploadSelection) -> Result<TaskId, UploadError> {
        let effects = self.shared.dispatch(Msg::SubmitRequested);
        let Some(submission) = effects.iter().find_map(|effect| match effect {
            Effect::Upload { submission } => Some(*submission),
            _ => None,
        }) else {
            factory_warn!("Submit refused: a task is already in progress");
            return Err(UploadError::Busy);
        };

        match self.shared.transport.submit(&upload).await {
            Ok(task_id) => {
                self.shared.dispatch(Msg::SubmitSucceeded {
                    submission,
                    task_id: task_id.clone(),
                    accepted_at: Utc::now(),
                });
                Ok(task_id)
            }
            Err(error) => {
                factory_warn!("Upload failed file={}: {}", upload.file_name, error);
                self.shared.dispatch(Msg::SubmitFailed {
                    submission,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn current_state(&self) -> TaskView {
        self.shared.lock().machine.view()
    }

    /// Link for a ready artifact; `None` unless the task succeeded with `kind`.
    pub fn download_link(&self, kind: ArtifactKind) -> Option<Url> {
        self.shared
            .lock()
            .machine
            .registry()?
            .download_link(&self.shared.base_url, kind)
    }

    /// Discards the current task. While a task is active this also cancels polling.
    pub fn reset(&self) {
        self.shared.dispatch(Msg::ResetRequested);
    }

    /// Owner teardown: abandons an unfinished task and stops polling, leaving
    /// the orchestrator idle. A finished task keeps its results.
    pub fn shutdown(&self) {
        self.shared.dispatch(Msg::ShutdownRequested);
        self.shared.stop_poller();
    }

    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poller
            .as_ref()
            .is_some_and(|poller| !poller.is_stopped())
    }

    pub fn base_url(&self) -> &Url {
        &self.shared.base_url
    }

    /// Receiver that sees a fresh [`TaskView`] after every visible change.
    pub fn subscribe(&self) -> watch::Receiver<TaskView> {
        self.shared.view_tx.subscribe()
    }

    /// Waits until the task reaches a terminal phase, or until there is no task
    /// to wait for (idle, e.g. after a reset). Returns the view at that point.
    pub async fn wait_for_terminal(&self) -> TaskView {
        let mut rx = self.subscribe();
        // The channel only carries changes; seed it with the current view.
        let mut view = self.current_state();
        loop {
            if view.phase.is_terminal() || view.phase == PhaseLabel::Idle {
                return view;
            }
            if rx.changed().await.is_err() {
                return self.current_state();
            }
            view = rx.borrow_and_update().clone();
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shared.stop_poller();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut inner = self.lock();
        self.dispatch_locked(&mut inner, msg)
    }

    /// Runs one update and executes polling effects before the lock is released,
    /// so a stop can never interleave with a start. Returns the remaining effects.
    fn dispatch_locked(&self, inner: &mut Inner, msg: Msg) -> Vec<Effect> {
        let machine = std::mem::take(&mut inner.machine);
        let (mut machine, effects) = update(machine, msg);
        if machine.consume_dirty() {
            let view = machine.view();
            factory_debug!("Task view changed phase={} logs={}", view.phase, view.logs.len());
            self.view_tx.send_replace(view);
        }
        inner.machine = machine;

        let mut remaining = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartPolling { task_id } => self.start_poller(inner, task_id),
                Effect::StopPolling { task_id } => {
                    if let Some(poller) = inner.poller.take() {
                        poller.stop();
                        factory_info!("Task finished polling task_id={}", task_id);
                    }
                }
                other => remaining.push(other),
            }
        }
        remaining
    }

    fn start_poller(&self, inner: &mut Inner, task_id: TaskId) {
        if let Some(existing) = inner.poller.as_ref() {
            if existing.task_id() == &task_id && !existing.is_stopped() {
                factory_warn!("Polling already running task_id={}", task_id);
                return;
            }
        }
        let sink: Arc<dyn SnapshotSink> = Arc::new(MachineSink {
            shared: self.me.clone(),
        });
        // Replacing a previous handle drops it, which cancels its loop.
        inner.poller = Some(self.scheduler.start(task_id, sink));
    }

    fn stop_poller(&self) {
        if let Some(poller) = self.lock().poller.take() {
            poller.stop();
        }
    }

    fn deliver(
        &self,
        task_id: &TaskId,
        result: Result<StatusSnapshot, PollError>,
    ) -> PollVerdict {
        let mut inner = self.lock();
        let owns_poller = inner
            .poller
            .as_ref()
            .is_some_and(|poller| poller.task_id() == task_id && !poller.is_stopped());
        if !owns_poller {
            factory_debug!("Discarding poll result for stopped task_id={}", task_id);
            return PollVerdict::Stop;
        }

        let msg = match result {
            Ok(snapshot) => Msg::PollSucceeded {
                task_id: task_id.clone(),
                snapshot,
            },
            Err(error) => Msg::PollFailed {
                task_id: task_id.clone(),
                error,
            },
        };
        self.dispatch_locked(&mut inner, msg);

        if inner.machine.active_task_id() == Some(task_id) {
            PollVerdict::Continue
        } else {
            PollVerdict::Stop
        }
    }
}

struct MachineSink {
    shared: Weak<Shared>,
}

impl SnapshotSink for MachineSink {
    fn deliver(&self, task_id: &TaskId, result: Result<StatusSnapshot, PollError>) -> PollVerdict {
        match self.shared.upgrade() {
            Some(shared) => shared.deliver(task_id, result),
            None => PollVerdict::Stop,
        }
    }
}
