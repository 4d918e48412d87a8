use std::sync::Arc;

use showroom_core::{ReadinessSnapshot, ScrapeKind, StatusUpdate};

use crate::error::ApiError;
use crate::session::SessionManager;
use crate::wire::{
    CancelAllResponse, CleanupResponse, ReadinessResponse, RemoteStatus, ScrapeAccepted,
    ScrapeRequest, SyncCounts, SyncResponse,
};

/// Typed wrappers over the scraper endpoint group. All calls ride the
/// session manager's authenticated dispatch path.
pub struct ScraperApi {
    session: Arc<SessionManager>,
}

impl ScraperApi {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Submits a catalog URL batch; returns the server-assigned task id.
    /// A quota rejection surfaces as `ApiError::RateLimited`.
    pub async fn submit(
        &self,
        kind: ScrapeKind,
        catalog_urls: Vec<String>,
    ) -> Result<String, ApiError> {
        let path = format!("scraper/scrape-{kind}");
        let body = serde_json::to_value(ScrapeRequest { catalog_urls })
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let accepted: ScrapeAccepted = self.session.post_json(&path, Some(body)).await?;
        Ok(accepted.task_id)
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusUpdate, ApiError> {
        let path = format!("scraper/scraper-status/{task_id}");
        let status: RemoteStatus = self.session.get_json(&path).await?;
        Ok(status.into_update())
    }

    pub async fn check_readiness(&self) -> Result<ReadinessSnapshot, ApiError> {
        let response: ReadinessResponse =
            self.session.get_json("scraper/check-readiness").await?;
        Ok(response.into_snapshot())
    }

    /// Asks the server to recount; returns its authoritative totals.
    pub async fn sync_tasks(&self) -> Result<SyncCounts, ApiError> {
        let response: SyncResponse = self.session.post_json("scraper/sync-tasks", None).await?;
        Ok(response.after)
    }

    pub async fn cleanup_my_tasks(&self) -> Result<u64, ApiError> {
        let response: CleanupResponse = self
            .session
            .post_json("scraper/cleanup-my-tasks", None)
            .await?;
        Ok(response.cleaned_tasks)
    }

    /// Elevated-role surface; the server rejects unprivileged callers.
    pub async fn cancel_all_tasks(&self) -> Result<u64, ApiError> {
        let response: CancelAllResponse = self
            .session
            .post_json("scraper/cancel-all-tasks", None)
            .await?;
        Ok(response.cancelled_tasks)
    }
}
