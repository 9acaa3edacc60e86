use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::post::{PostParams, PostResult};
use crate::thread::{Res, SubjectRecord};
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectFetchResult {
    pub threads: Vec<SubjectRecord>,
    pub not_modified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatFetchStatus {
    /// HTTP 200: full replace.
    Full,
    /// HTTP 206: appended to existing file.
    Partial,
    /// HTTP 304: no change.
    NotModified,
    /// HTTP 416: previous file flagged partially corrupt, caller should
    /// retry without Range next time.
    RangeUnsatisfiable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatFetchResult {
    pub responses: Vec<Res>,
    pub last_modified: Option<String>,
    pub status: DatFetchStatus,
    /// Byte length of the response body actually received.
    pub body_len: u64,
    /// The wire bytes of the body actually received, undecoded. The cache
    /// store appends/replaces the on-disk DAT with these bytes directly so
    /// that `size` stays exactly in sync with what `Range: bytes=<size>-`
    /// means to the upstream server on the next differential fetch.
    pub raw_body: Vec<u8>,
}

/// Polymorphic over board-type. One implementation per
/// `BoardType` variant, selected by [`crate::board::BoardType`] dispatch.
#[async_trait::async_trait]
pub trait BoardPlugin: Send + Sync {
    async fn fetch_subject(&self, board: &Board) -> Result<SubjectFetchResult>;

    /// `range_from` drives a differential fetch: `Some(n)` sends
    /// `Range: bytes=n-`.
    async fn fetch_dat(
        &self,
        board: &Board,
        thread_id: &str,
        range_from: Option<u64>,
        if_modified_since: Option<&str>,
    ) -> Result<DatFetchResult>;

    async fn post_response(&self, params: &PostParams, board: &Board) -> Result<PostResult>;
}
