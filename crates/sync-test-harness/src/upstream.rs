//! Mock of the upstream accounting API.

use crate::spawn_server;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// What the mock answers for one path.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Paginated bare JSON array.
    Items(Vec<Value>),
    /// Paginated `{"data": [...]}` envelope.
    Envelope(Vec<Value>),
    /// The given status on every request.
    Status(u16),
    /// `ok_pages` pages served normally, then `status` for every later page.
    FailAfter {
        items: Vec<Value>,
        ok_pages: usize,
        status: u16,
    },
    /// A fixed JSON body returned regardless of pagination.
    Raw(Value),
}

/// One request observed by [`MockUpstream`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn limit(&self) -> Option<usize> {
        self.query.get("limit").and_then(|v| v.parse().ok())
    }

    pub fn offset(&self) -> Option<usize> {
        self.query.get("offset").and_then(|v| v.parse().ok())
    }
}

#[derive(Default)]
struct UpstreamState {
    resources: Mutex<HashMap<String, Resource>>,
    requests: Mutex<Vec<RecordedRequest>>,
    latency: Mutex<Duration>,
}

/// In-process upstream API. Unregistered paths answer 404.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<UpstreamState>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> io::Result<Self> {
        let state = Arc::new(UpstreamState::default());
        let router = Router::new()
            .fallback(serve_resource)
            .with_state(Arc::clone(&state));
        let (addr, handle) = spawn_server(router).await?;
        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set(&self, path: &str, resource: Resource) {
        self.state.resources.lock().insert(path.to_string(), resource);
    }

    pub fn set_items(&self, path: &str, items: Vec<Value>) {
        self.set(path, Resource::Items(items));
    }

    pub fn set_status(&self, path: &str, status: u16) {
        self.set(path, Resource::Status(status));
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock() = latency;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_resource(
    State(state): State<Arc<UpstreamState>>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path().to_string();
    let request = RecordedRequest {
        path: path.clone(),
        query,
        authorization: header_value(header::AUTHORIZATION),
        accept: header_value(header::ACCEPT),
        received_at: Instant::now(),
    };
    let limit = request.limit().unwrap_or(usize::MAX);
    let offset = request.offset().unwrap_or(0);

    let page_index = {
        let mut requests = state.requests.lock();
        let earlier = requests.iter().filter(|r| r.path == path).count();
        requests.push(request);
        earlier
    };

    let latency = *state.latency.lock();
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let resource = state.resources.lock().get(&path).cloned();
    match resource {
        None => error_response(404),
        Some(Resource::Items(items)) => {
            Json(Value::Array(page(&items, offset, limit))).into_response()
        }
        Some(Resource::Envelope(items)) => {
            Json(json!({ "data": page(&items, offset, limit) })).into_response()
        }
        Some(Resource::Status(status)) => error_response(status),
        Some(Resource::FailAfter {
            items,
            ok_pages,
            status,
        }) => {
            if page_index < ok_pages {
                Json(Value::Array(page(&items, offset, limit))).into_response()
            } else {
                error_response(status)
            }
        }
        Some(Resource::Raw(body)) => Json(body).into_response(),
    }
}

fn page(items: &[Value], offset: usize, limit: usize) -> Vec<Value> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

fn error_response(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error_code": status.as_u16(),
            "message": status.canonical_reason().unwrap_or("error"),
        })),
    )
        .into_response()
}
