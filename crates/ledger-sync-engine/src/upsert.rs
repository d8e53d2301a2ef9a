//! Batched merge-on-conflict writes to the downstream REST store.

use crate::error::{truncate_body, SyncError, SyncResult};
use crate::types::Record;
use async_trait::async_trait;
use sync_config_and_utils::{Config, SyncContext};
use tracing::{debug, error};

/// Destination for transformed records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Write `records` to `table`, returning how many were submitted.
    async fn upsert(&self, table: &str, records: &[Record]) -> SyncResult<usize>;
}

/// REST client posting record batches with `resolution=merge-duplicates`.
///
/// A batch is accepted or rejected as a whole. When a batch fails the call
/// stops; earlier batches stay written.
#[derive(Clone)]
pub struct BatchUpserter {
    http_client: reqwest::Client,
    api_url: String,
    service_key: String,
    batch_size: usize,
}

impl BatchUpserter {
    /// Create a new upserter.
    ///
    /// # Arguments
    /// * `api_url` - The store's base URL (e.g., `https://xyz.supabase.co`)
    /// * `service_key` - Service credential, sent as `apikey` and bearer token
    /// * `batch_size` - Maximum records per request
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        service_key: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &Config, ctx: &SyncContext) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self::new(
            http_client,
            ctx.downstream_url(),
            ctx.downstream_service_key(),
            config.batch_size,
        ))
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    async fn post_batch(&self, table: &str, url: &str, batch: &[Record]) -> SyncResult<()> {
        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates")
            .json(batch)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(table, status, "Downstream write failed");
            return Err(SyncError::Downstream {
                table: table.to_string(),
                status,
                body: truncate_body(&body),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for BatchUpserter {
    async fn upsert(&self, table: &str, records: &[Record]) -> SyncResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let url = self.rest_url(table);
        let mut written = 0;
        for batch in records.chunks(self.batch_size) {
            self.post_batch(table, &url, batch).await?;
            written += batch.len();
            debug!(table, batch = batch.len(), written, "Batch upserted");
        }
        Ok(written)
    }
}

impl std::fmt::Debug for BatchUpserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchUpserter")
            .field("api_url", &self.api_url)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
