//! Results produced by one run.

use chrono::{SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// One transformed row, keyed by downstream column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Outcome of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Success,
    Error,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Success => "success",
            EntityStatus::Error => "error",
        }
    }
}

/// Outcome of a whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Error => "error",
        }
    }
}

/// Result of syncing one entity. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct EntityResult {
    pub entity: String,
    pub status: EntityStatus,
    /// Records written downstream.
    pub records: usize,
    /// Items received from upstream.
    pub fetched: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntityResult {
    pub fn success(entity: &str, records: usize, fetched: usize, duration: Duration) -> Self {
        Self {
            entity: entity.to_string(),
            status: EntityStatus::Success,
            records,
            fetched,
            duration,
            error: None,
        }
    }

    pub fn failure(entity: &str, error: String, duration: Duration) -> Self {
        Self {
            entity: entity.to_string(),
            status: EntityStatus::Error,
            records: 0,
            fetched: 0,
            duration,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EntityStatus::Success
    }
}

/// Aggregate of every [`EntityResult`] of one invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub total_records: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub timestamp: String,
    pub details: Vec<EntityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// A single-entity run: the entity's result is the whole run.
    pub fn single(result: EntityResult, duration: Duration) -> Self {
        let status = match result.status {
            EntityStatus::Success => RunStatus::Success,
            EntityStatus::Error => RunStatus::Error,
        };
        Self {
            status,
            mode: None,
            entity: Some(result.entity.clone()),
            total_records: result.records,
            duration,
            timestamp: now_timestamp(),
            error: result.error.clone(),
            details: vec![result],
        }
    }

    /// A grouped run over `details`, in execution order.
    pub fn grouped(mode: Option<&str>, details: Vec<EntityResult>, duration: Duration) -> Self {
        let failed: Vec<&str> = details
            .iter()
            .filter(|d| !d.is_success())
            .map(|d| d.entity.as_str())
            .collect();
        let error = (!failed.is_empty()).then(|| format!("Failed: {}", failed.join(", ")));

        Self {
            status: aggregate_status(&details),
            mode: mode.map(str::to_string),
            entity: None,
            total_records: details.iter().map(|d| d.records).sum(),
            duration,
            timestamp: now_timestamp(),
            error,
            details,
        }
    }

    pub fn total_fetched(&self) -> usize {
        self.details.iter().map(|d| d.fetched).sum()
    }

    pub fn failed_entities(&self) -> Vec<&str> {
        self.details
            .iter()
            .filter(|d| !d.is_success())
            .map(|d| d.entity.as_str())
            .collect()
    }
}

/// `success` when nothing failed, `error` when everything failed, otherwise
/// `partial`. An empty run is a success.
pub fn aggregate_status(details: &[EntityResult]) -> RunStatus {
    let failed = details.iter().filter(|d| !d.is_success()).count();
    if failed == 0 {
        RunStatus::Success
    } else if failed == details.len() {
        RunStatus::Error
    } else {
        RunStatus::Partial
    }
}

/// Seconds with one decimal, e.g. `"2.4s"`.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
