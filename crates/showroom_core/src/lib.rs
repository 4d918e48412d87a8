//! Showroom core: pure task-ledger state and catalog URL rules.
mod ledger;
mod normalize;
mod readiness;
mod task;
mod view;

pub use ledger::TaskLedger;
pub use normalize::{
    is_valid_catalog_url, normalize_url, partition_urls, ScrapeKind, UrlPartition,
};
pub use readiness::{ReadinessIssue, ReadinessSnapshot};
pub use task::{LocalId, StatusUpdate, TaskNotice, TaskOutcome, TaskStatus, TrackedTask};
pub use view::TaskRowView;
