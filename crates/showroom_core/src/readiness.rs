/// One entry from the server's readiness report, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessIssue {
    pub kind: String,
    pub message: String,
    pub action: Option<String>,
}

/// Point-in-time read of server-side task-quota state.
///
/// Ephemeral: re-fetched on an interval and before every submission
/// attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadinessSnapshot {
    pub ready: bool,
    pub user_tasks: u32,
    pub max_user_tasks: u32,
    pub total_tasks: u32,
    pub max_total_tasks: u32,
    pub can_start_task: bool,
    pub issues: Vec<ReadinessIssue>,
}

impl ReadinessSnapshot {
    /// The message to surface when a submission must be blocked, or `None`
    /// when submission may proceed. The server stays the authority; this is
    /// a best-effort client-side gate.
    pub fn blocker_message(&self) -> Option<String> {
        if self.can_start_task {
            return None;
        }
        Some(
            self.issues
                .first()
                .map(|issue| issue.message.clone())
                .unwrap_or_else(|| "system is not ready to accept new tasks".to_string()),
        )
    }
}
