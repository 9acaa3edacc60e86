//! Donguri (acorn) probe/login. The site exposes no structured API for
//! acorn possession, so state is inferred from substrings in the probed
//! page — the same substring set the post engine scans a post result
//! against for `DonguriConsumed`/`DonguriBroken` classification.

use crate::codec::{self, form_url_encode, Encoding};
use crate::cookie_jar::CookieJar;
use bbs_core::auth::DonguriState;
use bbs_core::http::{HttpBackend, HttpMethod, HttpRequest};
use bbs_core::proxy::ProxyMode;
use bbs_core::Result;
use std::sync::Arc;

const PROBE_URL: &str = "https://donguri.5ch.net/";
const LOGIN_URL: &str = "https://donguri.5ch.net/login.cgi";

const BROKEN_MARKERS: &[&str] = &["grtDngBroken", "broken_acorn", "[1044]", "[1045]", "[0088]"];
const CONSUMED_MARKER: &str = "grtDonguri";

pub struct DonguriAuth {
    http: Arc<dyn HttpBackend>,
    #[allow(dead_code)]
    cookies: Arc<CookieJar>,
}

impl DonguriAuth {
    pub fn new(http: Arc<dyn HttpBackend>, cookies: Arc<CookieJar>) -> Self {
        Self { http, cookies }
    }

    pub async fn refresh(&self) -> Result<DonguriState> {
        let req = HttpRequest::get(PROBE_URL, ProxyMode::Read);
        let resp = self.http.fetch(&req).await?;
        let body = codec::decode(&resp.body, Encoding::ShiftJis);
        Ok(classify_probe(&body))
    }

    pub async fn login(&self, mail: &str, pass: &str) -> Result<DonguriState> {
        let body = format!(
            "mail={}&pass={}",
            form_url_encode(mail, Encoding::Utf8),
            form_url_encode(pass, Encoding::Utf8),
        )
        .into_bytes();

        let mut req = HttpRequest::get(LOGIN_URL, ProxyMode::Write);
        req.method = HttpMethod::Post;
        req.headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
        req.body = Some(body);
        let resp = self.http.fetch(&req).await?;
        let body = codec::decode(&resp.body, Encoding::ShiftJis);
        Ok(classify_probe(&body))
    }
}

fn classify_probe(body: &str) -> DonguriState {
    let broken = BROKEN_MARKERS.iter().any(|m| body.contains(m));
    let consumed = body.contains(CONSUMED_MARKER);
    DonguriState {
        has_acorn: !broken && !consumed,
        last_checked: Some(chrono::Utc::now()),
        last_result: if broken {
            Some("broken".to_string())
        } else if consumed {
            Some("consumed".to_string())
        } else {
            Some("ok".to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_marker_clears_acorn() {
        let s = classify_probe("oops [1044] happened");
        assert!(!s.has_acorn);
        assert_eq!(s.last_result.as_deref(), Some("broken"));
    }

    #[test]
    fn consumed_marker_clears_acorn() {
        let s = classify_probe("grtDonguri consumed it");
        assert!(!s.has_acorn);
        assert_eq!(s.last_result.as_deref(), Some("consumed"));
    }

    #[test]
    fn clean_probe_has_acorn() {
        let s = classify_probe("everything is fine");
        assert!(s.has_acorn);
    }
}
