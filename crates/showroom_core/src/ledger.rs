use std::collections::BTreeMap;

use crate::view::TaskRowView;
use crate::{LocalId, ScrapeKind, StatusUpdate, TaskNotice, TaskOutcome, TaskStatus, TrackedTask};

/// In-memory map of the scraping jobs this client has started.
///
/// The ledger is a view cache over server-authoritative state: every
/// reconciliation point (sync, cleanup, zero-count detection) may overwrite
/// it wholesale, and applying a status observation is idempotent so
/// overlapping poll ticks stay harmless.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskLedger {
    tasks: BTreeMap<LocalId, TrackedTask>,
    next_id: LocalId,
    dirty: bool,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a job the server just accepted. The task starts out running;
    /// the first poll corrects that if the server still queues it.
    pub fn admit(
        &mut self,
        kind: ScrapeKind,
        remote_task_id: String,
        submitted_urls: Vec<String>,
        started_at_ms: i64,
    ) -> LocalId {
        self.next_id += 1;
        let local_id = self.next_id;
        self.tasks.insert(
            local_id,
            TrackedTask {
                local_id,
                remote_task_id: Some(remote_task_id),
                kind,
                status: TaskStatus::Running,
                submitted_urls,
                started_at_ms,
                progress: 0,
                result: None,
                error: None,
                notified: false,
            },
        );
        self.dirty = true;
        local_id
    }

    /// Applies one remote observation, last write wins per field.
    ///
    /// Returns a notice the first time the task is seen in a terminal state;
    /// later observations never re-notify, regardless of arrival order.
    /// Unknown ids are ignored so a poll racing a cleanup stays safe.
    pub fn apply_status(&mut self, local_id: LocalId, update: StatusUpdate) -> Option<TaskNotice> {
        let task = self.tasks.get_mut(&local_id)?;

        task.status = update.status;
        if let Some(progress) = update.progress {
            task.progress = progress.min(100);
        }
        if update.result.is_some() {
            task.result = update.result;
        }
        if update.error.is_some() {
            task.error = update.error;
        }
        if update.status.is_terminal() {
            task.progress = 100;
        }
        self.dirty = true;

        if update.status.is_terminal() && !task.notified {
            task.notified = true;
            let outcome = match update.status {
                TaskStatus::Failed => TaskOutcome::Failure,
                _ => TaskOutcome::Success,
            };
            return Some(TaskNotice {
                local_id,
                kind: task.kind,
                outcome,
                detail: task.error.clone(),
            });
        }
        None
    }

    /// Drops one task locally. Does not touch the server.
    pub fn dismiss(&mut self, local_id: LocalId) -> bool {
        let removed = self.tasks.remove(&local_id).is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Empties the ledger, returning how many tasks were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.tasks.len();
        if dropped > 0 {
            self.tasks.clear();
            self.dirty = true;
        }
        dropped
    }

    /// Reconciles against the server-reported count of active tasks.
    ///
    /// Local state never outlives server state: a total of zero empties the
    /// ledger entirely. Returns the number of tasks dropped.
    pub fn reconcile_total(&mut self, total_active: u64) -> usize {
        if total_active == 0 {
            self.clear()
        } else {
            0
        }
    }

    /// Tasks the polling loop should fetch: active, with a remote id.
    pub fn pollable(&self) -> Vec<(LocalId, String)> {
        self.tasks
            .values()
            .filter(|task| task.status.is_active())
            .filter_map(|task| {
                task.remote_task_id
                    .as_ref()
                    .map(|remote| (task.local_id, remote.clone()))
            })
            .collect()
    }

    pub fn get(&self, local_id: LocalId) -> Option<&TrackedTask> {
        self.tasks.get(&local_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| task.status.is_active())
            .count()
    }

    /// Row views in deterministic ascending id order.
    pub fn rows(&self) -> Vec<TaskRowView> {
        self.tasks.values().map(TaskRowView::from_task).collect()
    }

    /// Returns whether the ledger changed since the last call and resets
    /// the flag. Lets a render loop coalesce redraws.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
