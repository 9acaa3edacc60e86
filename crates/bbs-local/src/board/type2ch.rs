use super::common::{type2ch_dat_url, type2ch_post_url, type2ch_subject_url};
use crate::codec::{self, Encoding};
use crate::parsers::{dat, subject};
use crate::post_engine::{self, PostSubmission};
use async_trait::async_trait;
use bbs_core::board::Board;
use bbs_core::http::{HttpBackend, HttpRequest};
use bbs_core::plugin::{BoardPlugin, DatFetchResult, DatFetchStatus, SubjectFetchResult};
use bbs_core::post::{PostParams, PostResult};
use bbs_core::proxy::ProxyMode;
use bbs_core::{Error, Result};
use std::sync::Arc;

/// 5ch/2ch-family board plugin: `subject.txt` + `dat/<id>.dat`, posts to
/// `test/bbs.cgi`. Both read and write charset are Shift_JIS.
pub struct Type2chPlugin {
    http: Arc<dyn HttpBackend>,
}

impl Type2chPlugin {
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BoardPlugin for Type2chPlugin {
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
        let mut req = HttpRequest::get(type2ch_dat_url(board, thread_id), ProxyMode::Read);
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
            dat::parse_5field(&text)
        };

        Ok(DatFetchResult {
            responses,
            last_modified: resp.last_modified,
            status,
            body_len,
            raw_body: resp.body,
        })
    }

    async fn post_response(&self, params: &PostParams, board: &Board) -> Result<PostResult> {
        params.validate().map_err(Error::Validation)?;
        let referer = if params.is_new_thread() {
            board.url.clone()
        } else {
            format!("{}test/read.cgi/{}/{}/", board.server_url, board.bbs_id, params.thread_id)
        };
        let fields: Vec<(&str, String)> = vec![
            ("bbs", board.bbs_id.clone()),
            ("key", params.thread_id.clone()),
            ("time", chrono::Utc::now().timestamp().to_string()),
            ("FROM", params.name.clone()),
            ("mail", params.mail.clone()),
            ("MESSAGE", params.message.clone()),
            ("subject", params.subject.clone().unwrap_or_default()),
            ("submit", "書き込む".to_string()),
        ];
        post_engine::submit(
            self.http.as_ref(),
            PostSubmission {
                url: &type2ch_post_url(board),
                referer: &referer,
                fields,
                write_encoding: Encoding::ShiftJis,
            },
        )
        .await
    }
}
