use crate::{LocalId, ScrapeKind, TaskStatus, TrackedTask};

/// Flattened task row for rendering; one per tracked task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub local_id: LocalId,
    pub remote_task_id: Option<String>,
    pub kind: ScrapeKind,
    pub status: TaskStatus,
    pub progress: u8,
    pub url_count: usize,
    pub started_at_ms: i64,
    pub error: Option<String>,
}

impl TaskRowView {
    pub(crate) fn from_task(task: &TrackedTask) -> Self {
        Self {
            local_id: task.local_id,
            remote_task_id: task.remote_task_id.clone(),
            kind: task.kind,
            status: task.status,
            progress: task.progress,
            url_count: task.submitted_urls.len(),
            started_at_ms: task.started_at_ms,
            error: task.error.clone(),
        }
    }
}
