use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::proxy::ProxyMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    /// Byte offset to request via `Range: bytes=<range>-`.
    pub range: Option<u64>,
    pub if_modified_since: Option<String>,
    pub accept_gzip: bool,
    pub proxy_mode: ProxyMode,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, proxy_mode: ProxyMode) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
            connect_timeout_ms: None,
            read_timeout_ms: None,
            range: None,
            if_modified_since: None,
            accept_gzip: true,
            proxy_mode,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.unwrap_or(10_000))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.unwrap_or(30_000))
    }
}

/// Headers are lowercased on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub last_modified: Option<String>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_delay_ms: 8_000,
            max_retries: 3,
            retryable_statuses: vec![429, 503],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Exponential backoff starting at `initial_delay_ms`, doubling, capped
    /// at `max_delay_ms`. `attempt` is 0-based (0 = delay before first retry).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(31);
        let raw = self.initial_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }
}

#[async_trait::async_trait]
pub trait HttpBackend: Send + Sync {
    async fn fetch(&self, req: &HttpRequest) -> crate::Result<HttpResponse>;
}
