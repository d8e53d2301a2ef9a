//! Entrypoints that start ledger-sync runs.
//!
//! [`InvocationGate`] decides whether a request may run and what it runs;
//! [`server`] exposes it over HTTP, and the `ledger-sync` binary adds a
//! one-shot CLI for cron-style hosts.

pub mod cli;
mod error;
mod gate;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use gate::{GateError, InvocationGate, InvocationParams};
pub use server::{catalog, router, run_status_code, serve, serve_listener, AppState};
