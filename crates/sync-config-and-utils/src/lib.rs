//! Configuration, run context and shared utilities for ledger-sync.

mod config;
mod context;
mod error;
mod logging;

pub use config::{
    Config, DEFAULT_AUDIT_TABLE, DEFAULT_BATCH_SIZE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_INTERVAL_MS, DEFAULT_RUN_CACHE_ENTRIES,
    DEFAULT_UPSTREAM_BASE_URL, ENV_DOWNSTREAM_SERVICE_KEY, ENV_DOWNSTREAM_URL,
    ENV_INVOCATION_SECRET, ENV_UPSTREAM_TOKEN,
};
pub use context::SyncContext;
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
