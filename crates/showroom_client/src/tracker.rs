use std::sync::{Arc, Mutex};
use std::time::Duration;

use client_logging::{client_info, client_warn};
use showroom_core::{
    partition_urls, LocalId, ReadinessSnapshot, ScrapeKind, TaskLedger, TaskNotice, TaskRowView,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::scraper::ScraperApi;
use crate::session::{Clock, SessionManager};
use crate::wire::SyncCounts;

/// Receives the one-time terminal notifications produced by polling.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: TaskNotice);
}

/// Forwards notices into a channel; handy for tests and event loops.
pub struct ChannelNotificationSink {
    tx: std::sync::mpsc::Sender<TaskNotice>,
}

impl ChannelNotificationSink {
    pub fn new(tx: std::sync::mpsc::Sender<TaskNotice>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notice: TaskNotice) {
        let _ = self.tx.send(notice);
    }
}

/// What a submission attempt achieved, including the URLs that were
/// dropped before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub local_id: LocalId,
    pub task_id: String,
    pub submitted: Vec<String>,
    pub dropped: Vec<String>,
}

/// Result of a manual reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub user_tasks: u64,
    pub total_tasks: u64,
    /// Locally tracked tasks dropped because the server reported none.
    pub cleared_local: usize,
}

/// Keeps the local task ledger consistent with server-side truth.
///
/// Owns the ledger; the UI reads row views but every mutation funnels
/// through these operations. Polling, manual sync and cleanup may race;
/// ledger application is idempotent so last-resolved wins.
pub struct TaskTracker {
    api: ScraperApi,
    ledger: Mutex<TaskLedger>,
    sink: Arc<dyn NotificationSink>,
    readiness: Mutex<Option<ReadinessSnapshot>>,
    clock: Clock,
}

impl TaskTracker {
    pub fn new(
        session: Arc<SessionManager>,
        sink: Arc<dyn NotificationSink>,
        clock: Clock,
    ) -> Self {
        Self {
            api: ScraperApi::new(session),
            ledger: Mutex::new(TaskLedger::new()),
            sink,
            readiness: Mutex::new(None),
            clock,
        }
    }

    /// Submits a scraping job after the client-side readiness gate.
    ///
    /// Invalid URLs are dropped (and reported in the outcome) rather than
    /// failing the batch; an empty valid subset aborts before dispatch.
    pub async fn submit(
        &self,
        kind: ScrapeKind,
        raw_urls: &[String],
    ) -> Result<SubmitOutcome, ApiError> {
        let readiness = self.api.check_readiness().await?;
        let blocker = readiness.blocker_message();
        self.cache_readiness(readiness);
        if let Some(message) = blocker {
            return Err(ApiError::NotReady(message));
        }

        let partition = partition_urls(kind, raw_urls);
        if partition.valid.is_empty() {
            return Err(ApiError::NoValidUrls);
        }
        if !partition.invalid.is_empty() {
            client_warn!(
                "dropping {} invalid url(s) from {} submission",
                partition.invalid.len(),
                kind
            );
        }

        let task_id = self.api.submit(kind, partition.valid.clone()).await?;
        let started_at_ms = (self.clock)() * 1000;
        let local_id = self.ledger.lock().expect("ledger lock").admit(
            kind,
            task_id.clone(),
            partition.valid.clone(),
            started_at_ms,
        );
        client_info!("task {task_id} admitted as #{local_id}");

        // Counts changed; refresh the snapshot, best effort.
        if let Ok(after) = self.api.check_readiness().await {
            self.cache_readiness(after);
        }

        Ok(SubmitOutcome {
            local_id,
            task_id,
            submitted: partition.valid,
            dropped: partition.invalid,
        })
    }

    /// One polling pass over every active task. Fetch failures are logged
    /// and skipped; the next tick retries. Returns the notices fired.
    pub async fn poll_once(&self) -> Vec<TaskNotice> {
        let pollable = self.ledger.lock().expect("ledger lock").pollable();
        let mut notices = Vec::new();
        for (local_id, remote_id) in pollable {
            match self.api.status(&remote_id).await {
                Ok(update) => {
                    let notice = self
                        .ledger
                        .lock()
                        .expect("ledger lock")
                        .apply_status(local_id, update);
                    if let Some(notice) = notice {
                        self.sink.notify(notice.clone());
                        notices.push(notice);
                    }
                }
                Err(err) => {
                    client_warn!("status fetch failed for task {remote_id}: {err}");
                }
            }
        }
        notices
    }

    /// Starts the repeating poll task. Ticks may overlap a slow previous
    /// tick's fetches; ledger application tolerates that. Cancel via the
    /// returned handle.
    pub fn spawn_polling(self: Arc<Self>, interval: Duration) -> PollingHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let tracker = self;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh mount
            // does not double-fetch alongside the initial render.
            ticker.tick().await;
            let mut tick: u64 = 0;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        tick += 1;
                        client_logging::set_poll_tick(tick);
                        let _ = tracker.poll_once().await;
                    }
                }
            }
        });
        PollingHandle { token, handle }
    }

    /// Manual reconciliation: the server recounts, and a zero total clears
    /// the local ledger entirely (local state never outlives the server's).
    pub async fn sync(&self) -> Result<SyncReport, ApiError> {
        let counts: SyncCounts = self.api.sync_tasks().await?;
        let cleared_local = self
            .ledger
            .lock()
            .expect("ledger lock")
            .reconcile_total(counts.total_tasks);
        if cleared_local > 0 {
            client_info!("server reports no active tasks; dropped {cleared_local} local record(s)");
        }
        if let Ok(snapshot) = self.api.check_readiness().await {
            self.cache_readiness(snapshot);
        }
        Ok(SyncReport {
            user_tasks: counts.user_tasks,
            total_tasks: counts.total_tasks,
            cleared_local,
        })
    }

    /// Clears this user's server-side records, then the local list
    /// unconditionally, whatever count the server reports.
    pub async fn cleanup_own(&self) -> Result<u64, ApiError> {
        let cleaned = self.api.cleanup_my_tasks().await?;
        self.ledger.lock().expect("ledger lock").clear();
        Ok(cleaned)
    }

    /// System-wide cancel; server enforces the role requirement.
    pub async fn cancel_all(&self) -> Result<u64, ApiError> {
        let cancelled = self.api.cancel_all_tasks().await?;
        self.ledger.lock().expect("ledger lock").clear();
        Ok(cancelled)
    }

    /// Local-only removal of one row; the server-side task, if any, keeps
    /// running.
    pub fn dismiss(&self, local_id: LocalId) -> bool {
        self.ledger.lock().expect("ledger lock").dismiss(local_id)
    }

    pub async fn readiness(&self) -> Result<ReadinessSnapshot, ApiError> {
        let snapshot = self.api.check_readiness().await?;
        self.cache_readiness(snapshot.clone());
        Ok(snapshot)
    }

    /// Most recently fetched readiness snapshot, if any.
    pub fn last_readiness(&self) -> Option<ReadinessSnapshot> {
        self.readiness.lock().expect("readiness lock").clone()
    }

    pub fn rows(&self) -> Vec<TaskRowView> {
        self.ledger.lock().expect("ledger lock").rows()
    }

    pub fn active_count(&self) -> usize {
        self.ledger.lock().expect("ledger lock").active_count()
    }

    /// Whether the ledger changed since the last call; for render loops.
    pub fn consume_dirty(&self) -> bool {
        self.ledger.lock().expect("ledger lock").consume_dirty()
    }

    fn cache_readiness(&self, snapshot: ReadinessSnapshot) {
        *self.readiness.lock().expect("readiness lock") = Some(snapshot);
    }
}

/// Cancellable handle for the polling loop; start on mount, stop on
/// teardown.
pub struct PollingHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollingHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stops the loop and waits for the task to wind down.
    pub async fn stopped(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
