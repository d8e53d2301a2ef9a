//! HTTP entrypoint.

use crate::error::ApiError;
use crate::gate::{GateError, InvocationGate, InvocationParams};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use ledger_sync_engine::{Orchestrator, RunResult, RunStatus, Source, ENTITIES, MODES};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use sync_config_and_utils::Config;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    gate: Arc<InvocationGate>,
    run_lock: Option<Arc<Mutex<()>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let gate = InvocationGate::from_config(&config);
        let run_lock = config.serialize_runs.then(|| Arc::new(Mutex::new(())));
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            run_lock,
        }
    }

    /// Take the run lock when runs are serialized; `Busy` if another run
    /// holds it.
    fn try_acquire(&self) -> Result<Option<OwnedMutexGuard<()>>, GateError> {
        match &self.run_lock {
            Some(lock) => Arc::clone(lock)
                .try_lock_owned()
                .map(Some)
                .map_err(|_| GateError::Busy),
            None => Ok(None),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sync", get(run_sync).post(run_sync))
        .route("/api/entities", get(list_entities))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Sync gateway listening");
    serve_listener(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// 500 when the run as a whole failed, 200 otherwise.
pub fn run_status_code(result: &RunResult) -> StatusCode {
    match result.status {
        RunStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
        RunStatus::Success | RunStatus::Partial => StatusCode::OK,
    }
}

async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InvocationParams>,
) -> Result<(StatusCode, Json<RunResult>), ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.gate.authorize(authorization, params.key.as_deref())?;

    let orchestrator = Orchestrator::from_config(&state.config)?;
    let scope = state.gate.resolve(&params)?;
    let _guard = state.try_acquire()?;

    let result = orchestrator.run(&scope).await;
    Ok((run_status_code(&result), Json(result)))
}

async fn list_entities() -> Json<Value> {
    Json(catalog())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Registered entities in execution order and the named modes.
pub fn catalog() -> Value {
    let entities: Vec<Value> = ENTITIES
        .iter()
        .map(|spec| {
            let parent = match spec.source {
                Source::PerParent { parent, .. } => Some(parent),
                Source::Collection { .. } => None,
            };
            json!({
                "name": spec.name,
                "table": spec.table,
                "phase": spec.phase,
                "path": spec.source.path(),
                "parent": parent,
            })
        })
        .collect();

    json!({ "entities": entities, "modes": MODES })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_entities_and_modes() {
        let catalog = catalog();
        let entities = catalog["entities"].as_array().unwrap();
        assert_eq!(entities.len(), ENTITIES.len());
        assert_eq!(entities[0]["phase"], "reference");

        let payments = entities
            .iter()
            .find(|e| e["name"] == "invoice_payments")
            .unwrap();
        assert_eq!(payments["parent"], "/2.0/kb_invoice");
        assert_eq!(payments["phase"], "dependent");

        let modes = catalog["modes"].as_array().unwrap();
        assert!(modes.iter().any(|m| m["name"] == "daily"));
    }

    #[test]
    fn run_lock_only_when_serialized() {
        let state = AppState::new(Config::default());
        assert!(state.try_acquire().unwrap().is_none());

        let mut config = Config::default();
        config.serialize_runs = true;
        let state = AppState::new(config);
        let guard = state.try_acquire().unwrap();
        assert!(guard.is_some());
        assert!(matches!(state.try_acquire(), Err(GateError::Busy)));
        drop(guard);
        assert!(state.try_acquire().unwrap().is_some());
    }
}
