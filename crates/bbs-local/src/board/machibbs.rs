use super::common::{machi_dat_url, machi_post_url, type2ch_subject_url};
use crate::codec::{self, Encoding};
use crate::parsers::{dat, subject};
use async_trait::async_trait;
use bbs_core::board::Board;
use bbs_core::http::{HttpBackend, HttpMethod, HttpRequest};
use bbs_core::plugin::{BoardPlugin, DatFetchResult, DatFetchStatus, SubjectFetchResult};
use bbs_core::post::{PostParams, PostResult, PostResultType};
use bbs_core::proxy::ProxyMode;
use bbs_core::{Error, Result};
use std::sync::Arc;

/// Machi BBS plugin. The write flow is a single POST whose success is
/// signaled purely by an HTTP redirect (`Location` header), regardless of
/// what the response body says — unlike the two-phase 5ch-family flow.
pub struct MachiBbsPlugin {
    http: Arc<dyn HttpBackend>,
}

impl MachiBbsPlugin {
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BoardPlugin for MachiBbsPlugin {
    async fn fetch_subject(&self, board: &Board) -> Result<SubjectFetchResult> {
        let req = HttpRequest::get(type2ch_subject_url(board), ProxyMode::Read);
        let resp = self.http.fetch(&req).await?;
        if resp.status == 304 {
            return Ok(SubjectFetchResult { threads: Vec::new(), not_modified: true });
        }
        let text = codec::decode(&resp.body, Encoding::ShiftJis);
        Ok(SubjectFetchResult { threads: subject::parse(&text), not_modified: false })
    }

    async fn fetch_dat(
        &self,
        board: &Board,
        thread_id: &str,
        range_from: Option<u64>,
        if_modified_since: Option<&str>,
    ) -> Result<DatFetchResult> {
        let mut req = HttpRequest::get(machi_dat_url(board, thread_id), ProxyMode::Read);
        req.range = range_from;
        req.if_modified_since = if_modified_since.map(|s| s.to_string());
        let resp = self.http.fetch(&req).await?;

        let status = match resp.status {
            200 => DatFetchStatus::Full,
            206 => DatFetchStatus::Partial,
            304 => DatFetchStatus::NotModified,
            416 => DatFetchStatus::RangeUnsatisfiable,
            other => return Err(Error::Network(format!("unexpected DAT fetch status {other}"))),
        };

        let body_len = resp.body.len() as u64;
        let responses = if matches!(status, DatFetchStatus::NotModified | DatFetchStatus::RangeUnsatisfiable) {
            Vec::new()
        } else {
            let text = codec::decode(&resp.body, Encoding::ShiftJis);
            dat::parse_7field(&text)
        };

        Ok(DatFetchResult { responses, last_modified: resp.last_modified, status, body_len, raw_body: resp.body })
    }

    async fn post_response(&self, params: &PostParams, board: &Board) -> Result<PostResult> {
        params.validate().map_err(Error::Validation)?;
        let body = [
            ("BBS", board.bbs_id.as_str()),
            ("KEY", params.thread_id.as_str()),
            ("NAME", params.name.as_str()),
            ("MAIL", params.mail.as_str()),
            ("MESSAGE", params.message.as_str()),
            ("SUBJECT", params.subject.as_deref().unwrap_or("")),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={}", codec::form_url_encode(v, Encoding::ShiftJis)))
        .collect::<Vec<_>>()
        .join("&")
        .into_bytes();

        let mut req = HttpRequest::get(machi_post_url(board), ProxyMode::Write);
        req.method = HttpMethod::Post;
        req.headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
        req.headers.insert("Referer".to_string(), board.url.clone());
        req.body = Some(body);

        let resp = self.http.fetch(&req).await?;
        let success = is_redirect_success(&resp);
        Ok(PostResult {
            success,
            result_type: if success { PostResultType::Ok } else { PostResultType::Error },
            message: if success {
                "posted".to_string()
            } else {
                format!("unexpected status {}", resp.status)
            },
        })
    }
}

/// §4.I: Machi BBS post success is signaled by a bare HTTP redirect with a
/// `Location` header, regardless of body contents. The write-path client
/// (see `proxy.rs`) must not auto-follow the redirect, or this never sees
/// anything but the final 200.
fn is_redirect_success(resp: &bbs_core::http::HttpResponse) -> bool {
    (300..400).contains(&resp.status) && resp.header("location").is_some()
}

#[cfg(test)]
mod tests {
    use super::is_redirect_success;
    use bbs_core::http::HttpResponse;
    use std::collections::BTreeMap;

    fn resp(status: u16, location: Option<&str>) -> HttpResponse {
        let mut headers = BTreeMap::new();
        if let Some(loc) = location {
            headers.insert("location".to_string(), loc.to_string());
        }
        HttpResponse { status, headers, body: Vec::new(), last_modified: None }
    }

    #[test]
    fn redirect_with_location_is_success() {
        assert!(is_redirect_success(&resp(302, Some("/bbs/read.cgi/live/123/"))));
    }

    #[test]
    fn redirect_without_location_is_not_success() {
        assert!(!is_redirect_success(&resp(302, None)));
    }

    #[test]
    fn plain_200_is_not_success() {
        assert!(!is_redirect_success(&resp(200, None)));
    }
}
