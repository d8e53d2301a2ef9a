#![allow(dead_code)]

use async_trait::async_trait;
use ledger_sync_engine::{Record, RecordSink, SyncError, SyncResult, UpstreamSource};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use sync_config_and_utils::Config;

/// In-memory upstream. Unregistered paths behave like an unavailable
/// resource and return an empty collection.
#[derive(Default)]
pub struct FakeUpstream {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    failing: Mutex<HashMap<String, u16>>,
    calls: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn with(self, path: &str, items: Vec<Value>) -> Self {
        self.collections.lock().insert(path.to_string(), items);
        self
    }

    pub fn failing(self, path: &str, status: u16) -> Self {
        self.failing.lock().insert(path.to_string(), status);
        self
    }

    pub fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl UpstreamSource for FakeUpstream {
    async fn fetch_all(&self, path: &str) -> SyncResult<Vec<Value>> {
        self.calls.lock().push(path.to_string());
        if let Some(status) = self.failing.lock().get(path).copied() {
            return Err(SyncError::Upstream {
                endpoint: path.to_string(),
                status,
                body: "forbidden".into(),
            });
        }
        Ok(self.collections.lock().get(path).cloned().unwrap_or_default())
    }
}

/// In-memory sink recording every call; chosen tables fail.
#[derive(Default)]
pub struct FakeSink {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeSink {
    pub fn failing(self, table: &str) -> Self {
        self.failing.lock().insert(table.to_string());
        self
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    pub fn audit_rows(&self) -> Vec<Record> {
        self.rows("sync_log")
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RecordSink for FakeSink {
    async fn upsert(&self, table: &str, records: &[Record]) -> SyncResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.calls.lock().push((table.to_string(), records.len()));
        if self.failing.lock().contains(table) {
            return Err(SyncError::Downstream {
                table: table.to_string(),
                status: 500,
                body: "relation is locked".into(),
            });
        }
        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .extend(records.iter().cloned());
        Ok(records.len())
    }
}

/// `count` upstream items with ids starting at `first_id`.
pub fn items(first_id: i64, count: usize) -> Vec<Value> {
    (0..count as i64)
        .map(|n| json!({ "id": first_id + n, "title": format!("item {}", first_id + n) }))
        .collect()
}

/// A config pointing at local mocks, with no throttle delay.
pub fn mock_config(upstream_url: &str, downstream_url: &str) -> Config {
    let mut config = Config::default();
    config.upstream_base_url = upstream_url.to_string();
    config.upstream_token = Some("test-pat".into());
    config.downstream_url = Some(downstream_url.to_string());
    config.downstream_service_key = Some("test-service-key".into());
    config.invocation_secret = Some("test-secret".into());
    config.request_interval_ms = 0;
    config.http_timeout_secs = 5;
    config
}

pub fn at_least(elapsed: Duration, expected: Duration) -> bool {
    elapsed >= expected
}
