//! Authorization and scope resolution for run requests.

use ledger_sync_engine::RunScope;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sync_config_and_utils::{Config, ENV_INVOCATION_SECRET};
use thiserror::Error;
use tracing::warn;

/// Query parameters of a run request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationParams {
    pub entity: Option<String>,
    pub mode: Option<String>,
    pub key: Option<String>,
}

/// Reasons a run request is refused before anything is fetched.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Missing configuration: {0}")]
    NotConfigured(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("A sync run is already in progress")]
    Busy,
}

impl GateError {
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::NotConfigured(_) => 500,
            GateError::Unauthorized => 401,
            GateError::UnknownEntity(_) | GateError::UnknownMode(_) => 400,
            GateError::Busy => 409,
        }
    }
}

/// Shared-secret check plus entity/mode resolution.
///
/// Secrets are compared as SHA-256 digests so the comparison does not
/// depend on the length of the presented value.
pub struct InvocationGate {
    secret_digest: Option<[u8; 32]>,
    reject_unknown: bool,
}

impl InvocationGate {
    pub fn new(secret: Option<&str>, reject_unknown: bool) -> Self {
        Self {
            secret_digest: secret.filter(|s| !s.is_empty()).map(digest),
            reject_unknown,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.invocation_secret.as_deref(),
            config.reject_unknown_entity,
        )
    }

    /// Accept when either the `Authorization: Bearer` header or the `key`
    /// parameter matches the configured secret.
    pub fn authorize(
        &self,
        authorization: Option<&str>,
        key: Option<&str>,
    ) -> Result<(), GateError> {
        let Some(expected) = self.secret_digest else {
            return Err(GateError::NotConfigured(ENV_INVOCATION_SECRET.to_string()));
        };

        let bearer = authorization.and_then(|value| value.strip_prefix("Bearer "));
        let matches = |candidate: Option<&str>| candidate.is_some_and(|c| digest(c) == expected);

        if matches(bearer) || matches(key) {
            Ok(())
        } else {
            warn!(
                has_header = authorization.is_some(),
                has_key = key.is_some(),
                "Rejected sync invocation"
            );
            Err(GateError::Unauthorized)
        }
    }

    /// Single entity when `entity` names one, the named mode when `mode`
    /// names one, otherwise every entity. Unknown names fall through unless
    /// the gate rejects them.
    pub fn resolve(&self, params: &InvocationParams) -> Result<RunScope, GateError> {
        if let Some(name) = non_empty(&params.entity) {
            if let Some(scope) = RunScope::entity(name) {
                return Ok(scope);
            }
            if self.reject_unknown {
                return Err(GateError::UnknownEntity(name.to_string()));
            }
            warn!(entity = name, "Unknown entity requested, falling through");
        }

        if let Some(name) = non_empty(&params.mode) {
            if let Some(scope) = RunScope::mode(name) {
                return Ok(scope);
            }
            if self.reject_unknown {
                return Err(GateError::UnknownMode(name.to_string()));
            }
            warn!(mode = name, "Unknown mode requested, running every entity");
        }

        Ok(RunScope::full())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
