//! # ledger-sync-engine
//!
//! Pulls records from a paginated, rate-limited accounting API and upserts
//! them into a REST-fronted relational store.
//!
//! - [`RateLimitedPager`]: throttled `limit`/`offset` pagination
//! - [`BatchUpserter`]: merge-on-conflict writes in bounded batches
//! - [`AuditLogger`]: one audit row per entity and per run, never failing
//! - [`EntitySpec`]: the declarative fetch → transform → write shape
//! - [`Orchestrator`]: sequential, failure-isolated execution of a [`RunScope`]

mod audit;
mod cache;
pub mod entities;
mod entity;
mod error;
mod orchestrator;
mod pager;
mod types;
mod upsert;

pub use audit::{AuditLogger, AuditRecord};
pub use cache::RunCache;
pub use entities::{Mode, ENTITIES, MODES};
pub use entity::{
    child_path, prepare_records, run_entity, EntitySpec, Phase, Source, SyncOutcome,
    TransformContext, TransformFn,
};
pub use error::{truncate_body, SyncError, SyncResult, MAX_ERROR_BODY_CHARS};
pub use orchestrator::{Orchestrator, RunScope};
pub use pager::{unwrap_page, RateLimitedPager, UpstreamSource};
pub use types::{
    aggregate_status, format_duration, EntityResult, EntityStatus, Record, RunResult, RunStatus,
};
pub use upsert::{BatchUpserter, RecordSink};
