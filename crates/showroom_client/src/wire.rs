//! Request/response bodies for the backend endpoints, plus the mappings
//! from wire shape onto core types.

use serde::{Deserialize, Serialize};
use showroom_core::{ReadinessIssue, ReadinessSnapshot, StatusUpdate, TaskStatus};

use crate::store::UserRecord;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScrapeRequest {
    pub catalog_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeAccepted {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteStatus {
    pub status: String,
    pub progress: Option<u8>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl RemoteStatus {
    pub(crate) fn into_update(self) -> StatusUpdate {
        StatusUpdate {
            status: TaskStatus::from_remote(&self.status),
            progress: self.progress,
            result: self.result,
            error: self.error,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadinessResponse {
    pub ready: bool,
    pub limits: ReadinessLimits,
    #[serde(default)]
    pub issues: Vec<ReadinessIssueBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadinessLimits {
    pub user_tasks: u32,
    pub max_user_tasks: u32,
    pub total_tasks: u32,
    pub max_total_tasks: u32,
    pub can_start_task: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadinessIssueBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub action: Option<String>,
}

impl ReadinessResponse {
    pub(crate) fn into_snapshot(self) -> ReadinessSnapshot {
        ReadinessSnapshot {
            ready: self.ready,
            user_tasks: self.limits.user_tasks,
            max_user_tasks: self.limits.max_user_tasks,
            total_tasks: self.limits.total_tasks,
            max_total_tasks: self.limits.max_total_tasks,
            can_start_task: self.limits.can_start_task,
            issues: self
                .issues
                .into_iter()
                .map(|issue| ReadinessIssue {
                    kind: issue.kind,
                    message: issue.message,
                    action: issue.action,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncResponse {
    pub after: SyncCounts,
}

/// Server-authoritative task counts reported by the sync endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncCounts {
    pub user_tasks: u64,
    pub total_tasks: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CleanupResponse {
    pub cleaned_tasks: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelAllResponse {
    pub cancelled_tasks: u64,
}

/// Minimal product row for the filtered listing; the full CRUD surface
/// lives outside this client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductSummary>,
    pub total: u64,
}
