//! Configuration management for ledger-sync.
//!
//! Values come from an optional JSON file and are then overridden from the
//! environment. Credentials are normally supplied through the environment
//! only; they are never printed by `Debug`.

use crate::{CoreError, CoreResult, SyncContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default upstream API base URL (can be overridden at compile time via
/// LEDGER_SYNC_DEFAULT_UPSTREAM_URL).
pub const DEFAULT_UPSTREAM_BASE_URL: &str = match option_env!("LEDGER_SYNC_DEFAULT_UPSTREAM_URL") {
    Some(url) => url,
    None => "https://api.bexio.com",
};

/// Default audit table (can be overridden at compile time via
/// LEDGER_SYNC_DEFAULT_AUDIT_TABLE).
pub const DEFAULT_AUDIT_TABLE: &str = match option_env!("LEDGER_SYNC_DEFAULT_AUDIT_TABLE") {
    Some(table) => table,
    None => "sync_log",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 200;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RUN_CACHE_ENTRIES: usize = 8;

pub const ENV_UPSTREAM_TOKEN: &str = "BEXIO_PAT";
pub const ENV_DOWNSTREAM_URL: &str = "SUPABASE_URL";
pub const ENV_DOWNSTREAM_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_INVOCATION_SECRET: &str = "CRON_SECRET";

const ENV_LOG_LEVEL: &str = "LEDGER_SYNC_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "LEDGER_SYNC_LOG_FORMAT";
const ENV_LOG_FILE: &str = "LEDGER_SYNC_LOG_FILE";
const ENV_UPSTREAM_URL: &str = "LEDGER_SYNC_UPSTREAM_URL";
const ENV_PAGE_SIZE: &str = "LEDGER_SYNC_PAGE_SIZE";
const ENV_REQUEST_INTERVAL_MS: &str = "LEDGER_SYNC_REQUEST_INTERVAL_MS";
const ENV_BATCH_SIZE: &str = "LEDGER_SYNC_BATCH_SIZE";
const ENV_AUDIT_TABLE: &str = "LEDGER_SYNC_AUDIT_TABLE";
const ENV_HTTP_TIMEOUT_SECS: &str = "LEDGER_SYNC_HTTP_TIMEOUT_SECS";
const ENV_RUN_CACHE_ENTRIES: &str = "LEDGER_SYNC_RUN_CACHE_ENTRIES";
const ENV_REJECT_UNKNOWN_ENTITY: &str = "LEDGER_SYNC_REJECT_UNKNOWN_ENTITY";
const ENV_SERIALIZE_RUNS: &str = "LEDGER_SYNC_SERIALIZE_RUNS";

/// Main configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format ("json" or "pretty").
    pub log_format: String,
    /// Optional JSONL log file; stdout when absent.
    pub log_path: Option<PathBuf>,
    /// Upstream accounting API base URL.
    pub upstream_base_url: String,
    /// Upstream personal access token.
    pub upstream_token: Option<String>,
    /// Downstream REST store base URL.
    pub downstream_url: Option<String>,
    /// Downstream service credential.
    pub downstream_service_key: Option<String>,
    /// Shared secret required to invoke a sync over HTTP.
    pub invocation_secret: Option<String>,
    /// Items requested per upstream page.
    pub page_size: usize,
    /// Minimum delay between two upstream requests of one pager.
    pub request_interval_ms: u64,
    /// Records per downstream write.
    pub batch_size: usize,
    /// Downstream table receiving audit rows.
    pub audit_table: String,
    /// Per-request HTTP timeout.
    pub http_timeout_secs: u64,
    /// Maximum number of parent collections cached during one run.
    pub run_cache_entries: usize,
    /// Reject unknown entity or mode names instead of running everything.
    pub reject_unknown_entity: bool,
    /// Refuse overlapping runs within one process.
    pub serialize_runs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: "json".to_string(),
            log_path: None,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_token: None,
            downstream_url: None,
            downstream_service_key: None,
            invocation_secret: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            run_cache_entries: DEFAULT_RUN_CACHE_ENTRIES,
            reject_unknown_entity: false,
            serialize_runs: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("log_path", &self.log_path)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_token", &self.upstream_token.as_ref().map(|_| "***"))
            .field("downstream_url", &self.downstream_url)
            .field(
                "downstream_service_key",
                &self.downstream_service_key.as_ref().map(|_| "***"),
            )
            .field(
                "invocation_secret",
                &self.invocation_secret.as_ref().map(|_| "***"),
            )
            .field("page_size", &self.page_size)
            .field("request_interval_ms", &self.request_interval_ms)
            .field("batch_size", &self.batch_size)
            .field("audit_table", &self.audit_table)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("run_cache_entries", &self.run_cache_entries)
            .field("reject_unknown_entity", &self.reject_unknown_entity)
            .field("serialize_runs", &self.serialize_runs)
            .finish()
    }
}

impl Config {
    /// Defaults overridden from the process environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log_level = v;
        }
        if let Some(v) = get(ENV_LOG_FORMAT) {
            self.log_format = v;
        }
        if let Some(v) = get(ENV_LOG_FILE) {
            self.log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_UPSTREAM_URL) {
            self.upstream_base_url = v;
        }
        if let Some(v) = get(ENV_UPSTREAM_TOKEN) {
            self.upstream_token = Some(v);
        }
        if let Some(v) = get(ENV_DOWNSTREAM_URL) {
            self.downstream_url = Some(v);
        }
        if let Some(v) = get(ENV_DOWNSTREAM_SERVICE_KEY) {
            self.downstream_service_key = Some(v);
        }
        if let Some(v) = get(ENV_INVOCATION_SECRET) {
            self.invocation_secret = Some(v);
        }
        if let Some(v) = get(ENV_AUDIT_TABLE) {
            self.audit_table = v;
        }

        parse_into(&get, ENV_PAGE_SIZE, &mut self.page_size);
        parse_into(&get, ENV_REQUEST_INTERVAL_MS, &mut self.request_interval_ms);
        parse_into(&get, ENV_BATCH_SIZE, &mut self.batch_size);
        parse_into(&get, ENV_HTTP_TIMEOUT_SECS, &mut self.http_timeout_secs);
        parse_into(&get, ENV_RUN_CACHE_ENTRIES, &mut self.run_cache_entries);

        if let Some(v) = get(ENV_REJECT_UNKNOWN_ENTITY) {
            self.reject_unknown_entity = parse_flag(&v);
        }
        if let Some(v) = get(ENV_SERIALIZE_RUNS) {
            self.serialize_runs = parse_flag(&v);
        }
    }

    /// Minimum delay between upstream requests.
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The upstream base URL, parsed.
    pub fn upstream_url(&self) -> CoreResult<Url> {
        Url::parse(&self.upstream_base_url).map_err(CoreError::from)
    }

    /// Build the per-run context, naming every missing credential at once.
    pub fn sync_context(&self) -> CoreResult<SyncContext> {
        let mut missing = Vec::new();
        if self.upstream_token.is_none() {
            missing.push(ENV_UPSTREAM_TOKEN.to_string());
        }
        if self.downstream_url.is_none() {
            missing.push(ENV_DOWNSTREAM_URL.to_string());
        }
        if self.downstream_service_key.is_none() {
            missing.push(ENV_DOWNSTREAM_SERVICE_KEY.to_string());
        }

        match (
            &self.upstream_token,
            &self.downstream_url,
            &self.downstream_service_key,
        ) {
            (Some(token), Some(url), Some(key)) => {
                self.validate_tuning()?;
                SyncContext::new(token, url, key)
            }
            _ => Err(CoreError::MissingConfig(missing)),
        }
    }

    fn validate_tuning(&self) -> CoreResult<()> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(CoreError::Config("batch_size must be at least 1".into()));
        }
        self.upstream_url()?;
        Ok(())
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_into<T, G>(get: &G, name: &str, target: &mut T)
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(variable = name, value = %raw, "Ignoring unparseable numeric setting"),
    }
}
