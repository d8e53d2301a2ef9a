//! Append-only audit trail of entity and run outcomes.

use crate::types::{EntityResult, Record, RunResult};
use crate::upsert::RecordSink;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// One row of the audit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Entity name, or `full_sync` / `sync_<mode>` for run rows.
    pub entity: String,
    pub status: String,
    pub records_fetched: usize,
    pub records_upserted: usize,
    pub duration_ms: u64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn for_entity(
        result: &EntityResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: result.entity.clone(),
            status: result.status.as_str().to_string(),
            records_fetched: result.fetched,
            records_upserted: result.records,
            duration_ms: millis(result.duration),
            error_message: result.error.clone(),
            started_at,
            finished_at,
        }
    }

    pub fn for_run(
        name: &str,
        result: &RunResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: name.to_string(),
            status: result.status.as_str().to_string(),
            records_fetched: result.total_fetched(),
            records_upserted: result.total_records,
            duration_ms: millis(result.duration),
            error_message: result.error.clone(),
            started_at,
            finished_at,
        }
    }

    fn to_row(&self) -> serde_json::Result<Record> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(row) => Ok(row),
            _ => Ok(Record::new()),
        }
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Writes [`AuditRecord`]s through a [`RecordSink`]. Never fails.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn RecordSink>,
    table: String,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn RecordSink>, table: impl Into<String>) -> Self {
        Self {
            sink,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Append `record`. Failures are reported on the log and dropped.
    pub async fn record(&self, record: &AuditRecord) {
        let row = match record.to_row() {
            Ok(row) => row,
            Err(err) => {
                warn!(entity = %record.entity, error = %err, "Audit row could not be encoded");
                return;
            }
        };

        match self.sink.upsert(&self.table, &[row]).await {
            Ok(_) => debug!(entity = %record.entity, status = %record.status, "Audit row written"),
            Err(err) => warn!(
                entity = %record.entity,
                table = %self.table,
                error = %err,
                "Audit write failed, continuing"
            ),
        }
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
