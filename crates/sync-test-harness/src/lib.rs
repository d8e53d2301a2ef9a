//! Test doubles for ledger-sync.
//!
//! Both mocks are real HTTP servers bound to an ephemeral local port, so the
//! production `reqwest` clients are exercised end to end:
//!
//! - [`MockUpstream`] serves paginated collections the way the accounting API
//!   does (`limit`/`offset` query parameters, bare arrays or `{data: [...]}`
//!   envelopes, arbitrary error statuses).
//! - [`MockDownstream`] accepts `POST /rest/v1/{table}` batches and merges
//!   rows by `id` when the request asks for `resolution=merge-duplicates`.

mod downstream;
mod upstream;

pub use downstream::{MockDownstream, RecordedWrite};
pub use upstream::{MockUpstream, RecordedRequest, Resource};

use axum::Router;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Bind `router` on 127.0.0.1 with an OS-assigned port and serve it in the
/// background.
async fn spawn_server(router: Router) -> io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::warn!(error = %err, "mock server stopped");
        }
    });
    Ok((addr, handle))
}
