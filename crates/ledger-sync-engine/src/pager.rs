//! Throttled, paginated reads from the upstream accounting API.

use crate::error::{truncate_body, SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use sync_config_and_utils::{Config, SyncContext};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Source of complete upstream collections.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Every item of the collection at `path`, pages concatenated in order.
    async fn fetch_all(&self, path: &str) -> SyncResult<Vec<Value>>;
}

/// One page as returned by the API.
enum Page {
    Items(Vec<Value>),
    /// 404 or 500: the account does not provide this resource.
    Unavailable(StatusCode),
}

/// Offset paginator with a fixed minimum delay between requests.
///
/// The delay is measured from the previous request issued by this pager, so
/// one pager shared by every entity of a run keeps the whole run under the
/// upstream rate limit. The first request is sent immediately.
pub struct RateLimitedPager {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    page_size: usize,
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
    requests: AtomicU64,
}

impl RateLimitedPager {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        token: impl Into<String>,
        page_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            token: token.into(),
            page_size: page_size.max(1),
            interval,
            last_request: Mutex::new(None),
            requests: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config, ctx: &SyncContext) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self::new(
            http,
            config.upstream_url()?,
            ctx.upstream_token(),
            config.page_size,
            config.request_interval(),
        ))
    }

    /// Number of HTTP requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `path` is appended to the base URL, keeping any path prefix the base
    /// carries.
    fn page_url(&self, path: &str, offset: usize) -> SyncResult<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }

    async fn fetch_page(&self, path: &str, offset: usize) -> SyncResult<Page> {
        let url = self.page_url(path, offset)?;
        self.throttle().await;
        self.requests.fetch_add(1, Ordering::Relaxed);

        debug!(path, offset, "Fetching upstream page");
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::INTERNAL_SERVER_ERROR {
            return Ok(Page::Unavailable(status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Upstream {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: Value = response.json().await?;
        Ok(Page::Items(unwrap_page(body)))
    }
}

#[async_trait]
impl UpstreamSource for RateLimitedPager {
    async fn fetch_all(&self, path: &str) -> SyncResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            match self.fetch_page(path, offset).await? {
                Page::Unavailable(status) => {
                    info!(
                        path,
                        status = status.as_u16(),
                        "Upstream resource unavailable, treating as empty"
                    );
                    return Ok(Vec::new());
                }
                Page::Items(page) => {
                    let received = page.len();
                    items.extend(page);
                    if received != self.page_size {
                        break;
                    }
                    offset += self.page_size;
                }
            }
        }

        debug!(path, items = items.len(), "Upstream collection fetched");
        Ok(items)
    }
}

impl std::fmt::Debug for RateLimitedPager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedPager")
            .field("base_url", &self.base_url.as_str())
            .field("page_size", &self.page_size)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// A bare array is the page; an object's `data` array is the page; anything
/// else is an empty page.
pub fn unwrap_page(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
