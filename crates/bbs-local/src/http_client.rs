//! `reqwest`-backed implementation of `bbs_core::http::HttpBackend`, with
//! retry/backoff, conditional (Range / If-Modified-Since) fetch, and
//! cookie-jar attach/extract wired in around the bare transport.

use crate::cookie_jar::CookieJar;
use crate::proxy::ProxyManager;
use async_trait::async_trait;
use bbs_core::http::{HttpBackend, HttpRequest, HttpResponse};
use bbs_core::{Error, Result};
use std::sync::Arc;

pub struct ReqwestHttpBackend {
    proxy: Arc<ProxyManager>,
    cookies: Arc<CookieJar>,
    retry: bbs_core::http::RetryPolicy,
}

impl ReqwestHttpBackend {
    pub fn new(proxy: Arc<ProxyManager>, cookies: Arc<CookieJar>) -> Self {
        Self {
            proxy,
            cookies,
            retry: bbs_core::http::RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: bbs_core::http::RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, req: &HttpRequest) -> Result<HttpResponse> {
        let client = self.proxy.client(req.proxy_mode);
        let url = url::Url::parse(&req.url).map_err(|e| Error::Validation(e.to_string()))?;

        let mut builder = match req.method {
            bbs_core::http::HttpMethod::Get => client.get(url.clone()),
            bbs_core::http::HttpMethod::Post => client.post(url.clone()),
        };
        builder = builder
            .timeout(req.read_timeout())
            .header("User-Agent", "bbs-engine/0.1");

        for (k, v) in &req.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(range) = req.range {
            builder = builder.header("Range", format!("bytes={range}-"));
        }
        if let Some(ims) = &req.if_modified_since {
            builder = builder.header("If-Modified-Since", ims.as_str());
        }
        if !req.headers.contains_key("cookie") {
            if let Some(cookie_header) = self.cookies.build_cookie_header(&url, chrono::Utc::now()) {
                builder = builder.header("Cookie", cookie_header);
            }
        }
        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let mut headers = std::collections::BTreeMap::new();
        let mut set_cookie_lines = Vec::new();
        for (name, value) in resp.headers() {
            let Ok(value_str) = value.to_str() else {
                continue;
            };
            if name.as_str().eq_ignore_ascii_case("set-cookie") {
                set_cookie_lines.push(value_str.to_string());
            } else {
                headers.insert(name.as_str().to_ascii_lowercase(), value_str.to_string());
            }
        }
        let last_modified = headers.get("last-modified").cloned();

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .to_vec();

        if !set_cookie_lines.is_empty() {
            self.cookies.store_set_cookie_lines(&set_cookie_lines, &url);
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
            last_modified,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestHttpBackend {
    async fn fetch(&self, req: &HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(req).await {
                Ok(resp) if self.retry.is_retryable_status(resp.status) && attempt < self.retry.max_retries => {
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retry.max_retries => {
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                    attempt += 1;
                    let _ = &e;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
