//! Runs entities in dependency order and aggregates their results.

use crate::audit::{AuditLogger, AuditRecord};
use crate::cache::RunCache;
use crate::entities::{self, Mode};
use crate::entity::{run_entity, EntitySpec};
use crate::error::SyncResult;
use crate::pager::{RateLimitedPager, UpstreamSource};
use crate::types::{EntityResult, RunResult};
use crate::upsert::{BatchUpserter, RecordSink};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;
use sync_config_and_utils::{Config, DEFAULT_AUDIT_TABLE, DEFAULT_RUN_CACHE_ENTRIES};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// What one invocation syncs.
#[derive(Debug, Clone)]
pub enum RunScope {
    /// Exactly one entity; its result is the whole run.
    Entity(&'static EntitySpec),
    /// An ordered list of entities, optionally named by a mode.
    Group {
        mode: Option<&'static str>,
        entities: Vec<&'static EntitySpec>,
    },
}

impl RunScope {
    /// Every registered entity.
    pub fn full() -> Self {
        RunScope::Group {
            mode: None,
            entities: entities::all(),
        }
    }

    pub fn for_mode(mode: &'static Mode) -> Self {
        RunScope::Group {
            mode: Some(mode.name),
            entities: mode.specs(),
        }
    }

    pub fn entity(name: &str) -> Option<Self> {
        entities::entity(name).map(RunScope::Entity)
    }

    pub fn mode(name: &str) -> Option<Self> {
        entities::mode(name).map(RunScope::for_mode)
    }

    /// Name of the run-level audit row: `full_sync` or `sync_<mode>`.
    pub fn audit_name(&self) -> String {
        match self {
            RunScope::Entity(spec) => spec.name.to_string(),
            RunScope::Group { mode: None, .. } => "full_sync".to_string(),
            RunScope::Group {
                mode: Some(mode), ..
            } => format!("sync_{mode}"),
        }
    }

    pub fn entity_names(&self) -> Vec<&'static str> {
        match self {
            RunScope::Entity(spec) => vec![spec.name],
            RunScope::Group { entities, .. } => entities.iter().map(|spec| spec.name).collect(),
        }
    }
}

/// Sequential executor of one run at a time.
///
/// Owns the upstream source, the record sink and the audit logger. Each call
/// to [`Orchestrator::run`] gets its own run-scoped cache.
pub struct Orchestrator {
    upstream: Arc<dyn UpstreamSource>,
    sink: Arc<dyn RecordSink>,
    audit: AuditLogger,
    cache_entries: usize,
}

impl Orchestrator {
    pub fn new(upstream: Arc<dyn UpstreamSource>, sink: Arc<dyn RecordSink>) -> Self {
        let audit = AuditLogger::new(Arc::clone(&sink), DEFAULT_AUDIT_TABLE);
        Self {
            upstream,
            sink,
            audit,
            cache_entries: DEFAULT_RUN_CACHE_ENTRIES,
        }
    }

    /// Write audit rows to `table` instead of the default.
    pub fn with_audit_table(mut self, table: impl Into<String>) -> Self {
        self.audit = AuditLogger::new(Arc::clone(&self.sink), table);
        self
    }

    /// Bound the run-scoped cache; `0` disables it.
    pub fn with_cache_entries(mut self, entries: usize) -> Self {
        self.cache_entries = entries;
        self
    }

    /// Build the HTTP-backed orchestrator. Fails when credentials are missing.
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let ctx = config.sync_context()?;
        let pager = RateLimitedPager::from_config(config, &ctx)?;
        let upserter = BatchUpserter::from_config(config, &ctx)?;
        Ok(Self::new(Arc::new(pager), Arc::new(upserter))
            .with_audit_table(config.audit_table.clone())
            .with_cache_entries(config.run_cache_entries))
    }

    pub async fn run(&self, scope: &RunScope) -> RunResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_run", %run_id, scope = %scope.audit_name());
        self.execute(scope).instrument(span).await
    }

    async fn execute(&self, scope: &RunScope) -> RunResult {
        let started_at = Utc::now();
        let timer = Instant::now();
        let synced_at = started_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut cache = RunCache::new(self.cache_entries, entities::parent_paths());

        match scope {
            RunScope::Entity(spec) => {
                info!(entity = spec.name, "Starting single-entity run");
                let result = self.run_one(spec, &mut cache, &synced_at).await;
                RunResult::single(result, timer.elapsed())
            }
            RunScope::Group { mode, entities } => {
                info!(entities = entities.len(), "Starting run");
                let mut details = Vec::with_capacity(entities.len());
                for spec in entities {
                    details.push(self.run_one(spec, &mut cache, &synced_at).await);
                }

                let result = RunResult::grouped(*mode, details, timer.elapsed());
                if result.error.is_some() {
                    warn!(
                        status = result.status.as_str(),
                        failed = ?result.failed_entities(),
                        "Run finished with failures"
                    );
                } else {
                    info!(
                        records = result.total_records,
                        cache_hits = cache.hits(),
                        "Run finished"
                    );
                }

                self.audit
                    .record(&AuditRecord::for_run(
                        &scope.audit_name(),
                        &result,
                        started_at,
                        Utc::now(),
                    ))
                    .await;
                result
            }
        }
    }

    async fn run_one(
        &self,
        spec: &EntitySpec,
        cache: &mut RunCache,
        synced_at: &str,
    ) -> EntityResult {
        run_entity(
            spec,
            self.upstream.as_ref(),
            self.sink.as_ref(),
            &self.audit,
            cache,
            synced_at,
        )
        .await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("audit", &self.audit)
            .field("cache_entries", &self.cache_entries)
            .finish_non_exhaustive()
    }
}
