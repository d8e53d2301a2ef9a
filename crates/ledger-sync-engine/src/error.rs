//! Error types for the sync engine.
//!
//! Upstream and downstream failures carry the endpoint or table, the HTTP
//! status and a truncated response body so an audit row is enough to
//! diagnose a failed entity.

use sync_config_and_utils::CoreError;
use thiserror::Error;

/// Maximum number of characters of a response body kept in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level failure (connect, timeout, TLS, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream API answered with a status other than success, 404 or 500.
    #[error("upstream {endpoint} returned {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The downstream store rejected a batch.
    #[error("downstream {table} returned {status}: {body}")]
    Downstream {
        table: String,
        status: u16,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Missing or invalid configuration; the run cannot start.
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

impl SyncError {
    /// True when the run could not start because configuration is missing.
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Cut `body` to [`MAX_ERROR_BODY_CHARS`] characters, marking the cut with `…`.
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("  not found \n"), "not found");
    }

    #[test]
    fn long_bodies_are_cut_on_char_boundary() {
        let body = "é".repeat(MAX_ERROR_BODY_CHARS + 20);
        let cut = truncate_body(&body);
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn upstream_error_names_endpoint_and_status() {
        let err = SyncError::Upstream {
            endpoint: "/2.0/kb_invoice".into(),
            status: 403,
            body: "forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "upstream /2.0/kb_invoice returned 403: forbidden"
        );
    }

    #[test]
    fn missing_config_is_a_config_error() {
        let err = SyncError::from(CoreError::MissingConfig(vec!["BEXIO_PAT".into()]));
        assert!(err.is_config());
        assert_eq!(err.to_string(), "Missing configuration: BEXIO_PAT");
    }
}
