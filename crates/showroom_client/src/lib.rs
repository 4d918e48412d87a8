//! Showroom client: authenticated API access and task tracking.
mod catalog;
mod config;
mod error;
mod latest;
mod scraper;
mod session;
mod store;
mod tracker;
mod wire;

pub use catalog::{CatalogApi, ProductQuery};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
pub use error::ApiError;
pub use latest::LatestGate;
pub use scraper::ScraperApi;
pub use session::{Clock, SessionManager};
pub use store::{
    FileSessionStore, MemorySessionStore, SessionSnapshot, SessionStore, StoreError, UserRecord,
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, USER_RECORD_TTL_SECS,
};
pub use tracker::{
    ChannelNotificationSink, NotificationSink, PollingHandle, SubmitOutcome, SyncReport,
    TaskTracker,
};
pub use wire::{ProductPage, ProductSummary, SyncCounts};
