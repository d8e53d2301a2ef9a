//! Mock of the downstream REST store.

use crate::spawn_server;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

/// One write observed by [`MockDownstream`], accepted or not.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub table: String,
    pub rows: Vec<Value>,
    pub prefer: Option<String>,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct DownstreamState {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    writes: Mutex<Vec<RecordedWrite>>,
    failing: Mutex<HashMap<String, u16>>,
}

/// In-process downstream store.
///
/// Rows carrying an `id` are merged by that id when the request prefers
/// `resolution=merge-duplicates`; without it a conflicting id answers 409.
/// Rows without an `id` are appended. A batch repeating an id answers 500,
/// as PostgreSQL refuses to touch one row twice in a single upsert.
pub struct MockDownstream {
    addr: SocketAddr,
    state: Arc<DownstreamState>,
    handle: JoinHandle<()>,
}

impl MockDownstream {
    pub async fn start() -> io::Result<Self> {
        let state = Arc::new(DownstreamState::default());
        let router = Router::new()
            .route("/rest/v1/{table}", post(write_rows))
            .with_state(Arc::clone(&state));
        let (addr, handle) = spawn_server(router).await?;
        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer every write to `table` with `status`.
    pub fn fail_table(&self, table: &str, status: u16) {
        self.state.failing.lock().insert(table.to_string(), status);
    }

    pub fn heal_table(&self, table: &str) {
        self.state.failing.lock().remove(table);
    }

    /// Stored rows of `table`, in first-insert order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .tables
            .lock()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.writes.lock().clone()
    }

    pub fn writes_for(&self, table: &str) -> Vec<RecordedWrite> {
        self.state
            .writes
            .lock()
            .iter()
            .filter(|w| w.table == table)
            .cloned()
            .collect()
    }
}

impl Drop for MockDownstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn write_rows(
    State(state): State<Arc<DownstreamState>>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let rows = match body {
        Value::Array(rows) => rows,
        single @ Value::Object(_) => vec![single],
        _ => return rejection(StatusCode::BAD_REQUEST, "PGRST102", "body must be JSON"),
    };
    let prefer = header_value("prefer");

    state.writes.lock().push(RecordedWrite {
        table: table.clone(),
        rows: rows.clone(),
        prefer: prefer.clone(),
        apikey: header_value("apikey"),
        authorization: header_value("authorization"),
        content_type: header_value("content-type"),
    });

    if let Some(status) = state.failing.lock().get(&table).copied() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return rejection(status, "XX000", "table unavailable");
    }

    let mut seen = HashSet::new();
    for id in rows.iter().filter_map(|row| row.get("id")) {
        if !seen.insert(id.to_string()) {
            return rejection(
                StatusCode::INTERNAL_SERVER_ERROR,
                "21000",
                "ON CONFLICT DO UPDATE command cannot affect row a second time",
            );
        }
    }

    let merge = prefer
        .as_deref()
        .is_some_and(|p| p.contains(MERGE_DUPLICATES));

    let mut tables = state.tables.lock();
    let stored = tables.entry(table).or_default();
    if !merge {
        let conflict = rows.iter().filter_map(|row| row.get("id")).any(|id| {
            stored.iter().any(|existing| existing.get("id") == Some(id))
        });
        if conflict {
            return rejection(
                StatusCode::CONFLICT,
                "23505",
                "duplicate key value violates unique constraint",
            );
        }
    }

    for row in rows {
        let position = row
            .get("id")
            .and_then(|id| stored.iter().position(|existing| existing.get("id") == Some(id)));
        match (position, row) {
            (Some(index), Value::Object(fields)) => {
                if let Some(Value::Object(existing)) = stored.get_mut(index) {
                    existing.extend(fields);
                }
            }
            (_, row) => stored.push(row),
        }
    }

    StatusCode::CREATED.into_response()
}

fn rejection(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "code": code, "message": message, "details": null, "hint": null })),
    )
        .into_response()
}
