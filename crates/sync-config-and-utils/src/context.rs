//! Credentials and endpoints required by one sync invocation.

use crate::{CoreError, CoreResult};
use std::fmt;
use url::Url;

/// Validated credentials for one run.
///
/// Built from [`crate::Config::sync_context`]; the fields stay private so the
/// secrets can only leave through the explicit accessors.
#[derive(Clone)]
pub struct SyncContext {
    upstream_token: String,
    downstream_url: String,
    downstream_service_key: String,
}

impl SyncContext {
    pub fn new(
        upstream_token: impl Into<String>,
        downstream_url: impl Into<String>,
        downstream_service_key: impl Into<String>,
    ) -> CoreResult<Self> {
        let upstream_token = upstream_token.into();
        let downstream_service_key = downstream_service_key.into();
        let downstream_url = downstream_url.into().trim_end_matches('/').to_string();

        if upstream_token.is_empty() || downstream_service_key.is_empty() {
            return Err(CoreError::Config("credentials must not be empty".into()));
        }
        Url::parse(&downstream_url)?;

        Ok(Self {
            upstream_token,
            downstream_url,
            downstream_service_key,
        })
    }

    pub fn upstream_token(&self) -> &str {
        &self.upstream_token
    }

    /// Downstream base URL without a trailing slash.
    pub fn downstream_url(&self) -> &str {
        &self.downstream_url
    }

    pub fn downstream_service_key(&self) -> &str {
        &self.downstream_service_key
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("downstream_url", &self.downstream_url)
            .finish_non_exhaustive()
    }
}
