//! Error responses of the HTTP entrypoint.

use crate::gate::GateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use ledger_sync_engine::SyncError;
use serde::Serialize;

/// JSON body of every refused request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
    pub timestamp: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Gate(#[from] GateError),

    #[error("{0}")]
    Sync(#[from] SyncError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Gate(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = ErrorBody {
            status: "error",
            error: self.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_config_and_utils::CoreError;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::from(GateError::Unauthorized).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::from(GateError::Busy).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(GateError::UnknownMode("weekly".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        let missing = SyncError::from(CoreError::MissingConfig(vec!["BEXIO_PAT".into()]));
        assert_eq!(
            ApiError::from(missing).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_passes_through() {
        let missing = SyncError::from(CoreError::MissingConfig(vec!["SUPABASE_URL".into()]));
        assert_eq!(
            ApiError::from(missing).to_string(),
            "Missing configuration: SUPABASE_URL"
        );
    }
}
