//! The shared fetch → transform → write → audit shape of every entity.

use crate::audit::{AuditLogger, AuditRecord};
use crate::cache::RunCache;
use crate::error::SyncResult;
use crate::pager::UpstreamSource;
use crate::types::{EntityResult, Record};
use crate::upsert::RecordSink;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Inputs available to a transform besides the upstream item.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Timestamp stamped on every record of the run.
    pub synced_at: &'a str,
    /// `id` of the parent item for dependent entities.
    pub parent_id: Option<&'a Value>,
}

/// Pure, total mapping from one upstream item to one downstream record.
pub type TransformFn = fn(&Value, &TransformContext<'_>) -> Record;

/// Dependency phase; entities of a grouped run execute in phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Reference,
    Master,
    Transactional,
    Dependent,
}

/// Where an entity's upstream items come from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// One paginated collection.
    Collection { path: &'static str },
    /// One paginated collection per item of `parent`; `child` contains `{id}`.
    PerParent {
        parent: &'static str,
        child: &'static str,
    },
}

impl Source {
    pub fn path(&self) -> &'static str {
        match self {
            Source::Collection { path } => path,
            Source::PerParent { child, .. } => child,
        }
    }
}

/// Declarative description of one synced entity.
#[derive(Clone, Copy)]
pub struct EntitySpec {
    pub name: &'static str,
    pub table: &'static str,
    pub phase: Phase,
    pub source: Source,
    pub transform: TransformFn,
}

impl std::fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySpec")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("phase", &self.phase)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Counts of one successful entity sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub written: usize,
}

impl EntitySpec {
    /// Fetch, transform and write this entity. Errors abort the entity.
    pub async fn sync(
        &self,
        upstream: &dyn UpstreamSource,
        sink: &dyn RecordSink,
        cache: &mut RunCache,
        synced_at: &str,
    ) -> SyncResult<SyncOutcome> {
        let (fetched, records) = match self.source {
            Source::Collection { path } => {
                let items = fetch_cached(upstream, cache, path).await?;
                let ctx = TransformContext {
                    synced_at,
                    parent_id: None,
                };
                let records: Vec<Record> =
                    items.iter().map(|item| (self.transform)(item, &ctx)).collect();
                (items.len(), records)
            }
            Source::PerParent { parent, child } => {
                self.fetch_children(upstream, cache, parent, child, synced_at)
                    .await?
            }
        };

        let records = prepare_records(self.name, records);
        let written = sink.upsert(self.table, &records).await?;
        Ok(SyncOutcome { fetched, written })
    }

    /// Inner pagination loop per parent item. A parent whose children cannot
    /// be fetched is skipped.
    async fn fetch_children(
        &self,
        upstream: &dyn UpstreamSource,
        cache: &mut RunCache,
        parent: &'static str,
        child: &'static str,
        synced_at: &str,
    ) -> SyncResult<(usize, Vec<Record>)> {
        let parents = fetch_cached(upstream, cache, parent).await?;
        let mut fetched = 0;
        let mut skipped = 0;
        let mut records = Vec::new();

        for parent_item in parents.iter() {
            let Some(parent_id) = parent_item.get("id").filter(|id| !id.is_null()) else {
                continue;
            };
            let path = child_path(child, parent_id);
            match upstream.fetch_all(&path).await {
                Ok(children) => {
                    fetched += children.len();
                    let ctx = TransformContext {
                        synced_at,
                        parent_id: Some(parent_id),
                    };
                    records.extend(children.iter().map(|item| (self.transform)(item, &ctx)));
                }
                Err(err) => {
                    skipped += 1;
                    warn!(entity = self.name, path = %path, error = %err, "Skipping parent item");
                }
            }
        }

        if skipped > 0 {
            warn!(
                entity = self.name,
                skipped,
                parents = parents.len(),
                "Some parent items were skipped"
            );
        }
        Ok((fetched, records))
    }
}

/// Substitute `{id}` in `template` with the parent id.
pub fn child_path(template: &str, parent_id: &Value) -> String {
    let id = match parent_id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };
    template.replace("{id}", &id)
}

async fn fetch_cached(
    upstream: &dyn UpstreamSource,
    cache: &mut RunCache,
    path: &str,
) -> SyncResult<Arc<Vec<Value>>> {
    if let Some(items) = cache.get(path) {
        debug!(path, items = items.len(), "Run cache hit");
        return Ok(items);
    }
    let items = Arc::new(upstream.fetch_all(path).await?);
    cache.insert(path, Arc::clone(&items));
    Ok(items)
}

/// Drop records without an `id` and collapse repeated ids, keeping the last
/// occurrence at the position of the first.
pub fn prepare_records(entity: &str, records: Vec<Record>) -> Vec<Record> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Record> = Vec::with_capacity(records.len());
    let mut missing_id = 0;
    let mut duplicates = 0;

    for record in records {
        let key = match record.get("id") {
            None | Some(Value::Null) => {
                missing_id += 1;
                continue;
            }
            Some(id) => id.to_string(),
        };
        match positions.get(&key) {
            Some(&index) => {
                duplicates += 1;
                kept[index] = record;
            }
            None => {
                positions.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    if missing_id > 0 {
        warn!(entity, dropped = missing_id, "Dropped records without id");
    }
    if duplicates > 0 {
        warn!(entity, duplicates, "Collapsed records with repeated id");
    }
    kept
}

/// Run one entity end to end and audit the outcome. Never fails: errors are
/// captured in the returned [`EntityResult`].
pub async fn run_entity(
    spec: &EntitySpec,
    upstream: &dyn UpstreamSource,
    sink: &dyn RecordSink,
    audit: &AuditLogger,
    cache: &mut RunCache,
    synced_at: &str,
) -> EntityResult {
    let started_at = Utc::now();
    let timer = Instant::now();

    let result = match spec.sync(upstream, sink, cache, synced_at).await {
        Ok(outcome) => {
            let result =
                EntityResult::success(spec.name, outcome.written, outcome.fetched, timer.elapsed());
            info!(
                entity = spec.name,
                fetched = outcome.fetched,
                records = outcome.written,
                duration_ms = result.duration.as_millis() as u64,
                "Entity synced"
            );
            result
        }
        Err(err) => {
            error!(entity = spec.name, error = %err, "Entity sync failed");
            EntityResult::failure(spec.name, err.to_string(), timer.elapsed())
        }
    };

    audit
        .record(&AuditRecord::for_entity(&result, started_at, Utc::now()))
        .await;
    result
}
