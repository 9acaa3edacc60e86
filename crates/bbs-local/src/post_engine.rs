//! Two-phase post submission shared by the 5ch-family board plugins
//! (`Type2ch`, `Shitaraba`, `Jbbs`). Machi BBS's write flow is simple enough
//! (single POST, success signaled by an HTTP redirect) that it is handled
//! directly in `board::machibbs` instead of routed through here.

use crate::codec::{form_url_encode, Encoding};
use bbs_core::http::{HttpBackend, HttpRequest, HttpMethod};
use bbs_core::post::{PostResult, PostResultType};
use bbs_core::proxy::ProxyMode;
use bbs_core::Result;
use std::collections::BTreeMap;

/// Scans decoded response bodies against fixed markers, first match wins.
pub fn classify_post_result(body: &str) -> PostResultType {
    if body.contains(":true -->") || body.contains("書きこみが終わりました") || body.contains("終わりました") {
        return PostResultType::Ok;
    }
    if body.contains(":cookie -->") {
        return PostResultType::Cookie;
    }
    if body.contains(":check -->") || has_confirm_form(body) {
        return PostResultType::Check;
    }
    if body.contains("grtDonguri") {
        return PostResultType::DonguriConsumed;
    }
    if body.contains("grtDngBroken") || body.contains("broken_acorn")
        || body.contains("[1044]") || body.contains("[1045]") || body.contains("[0088]")
    {
        return PostResultType::DonguriBroken;
    }
    PostResultType::Error
}

fn has_confirm_form(body: &str) -> bool {
    body.contains(r#"name="yuki""#)
        || (body.contains(r#"name="subject""#) && body.contains(r#"name="MESSAGE""#))
}

/// Extracts every `<input type="hidden" name=X value=Y>` pair, tolerant of
/// attribute order and quote style.
pub fn extract_hidden_fields(html: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = html;
    while let Some(tag_start) = rest.find("<input") {
        let Some(tag_end) = rest[tag_start..].find('>') else {
            break;
        };
        let tag = &rest[tag_start..tag_start + tag_end];
        rest = &rest[tag_start + tag_end + 1..];
        if !tag.contains(r#"type="hidden""#) && !tag.contains("type='hidden'") {
            continue;
        }
        let name = extract_attr(tag, "name");
        let value = extract_attr(tag, "value").unwrap_or_default();
        if let Some(name) = name {
            out.push((name, value));
        }
    }
    out
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let needle = format!("{attr}={quote}");
        if let Some(start) = tag.find(&needle) {
            let value_start = start + needle.len();
            if let Some(len) = tag[value_start..].find(quote) {
                return Some(tag[value_start..value_start + len].to_string());
            }
        }
    }
    None
}

pub struct PostSubmission<'a> {
    pub url: &'a str,
    pub referer: &'a str,
    pub fields: Vec<(&'a str, String)>,
    pub write_encoding: Encoding,
}

/// Runs phase one; if the response needs confirmation, appends
/// `submit=書き込む` to the original field set and posts again to the same
/// URL with the server's own hidden-field echoes layered on top.
pub async fn submit(
    http: &dyn HttpBackend,
    submission: PostSubmission<'_>,
) -> Result<PostResult> {
    let (_status, body) = post_once(http, submission.url, submission.referer, &submission.fields, submission.write_encoding).await?;
    let decoded = crate::codec::decode(&body, submission.write_encoding);
    let classification = classify_post_result(&decoded);

    if classification != PostResultType::Check {
        return Ok(finish(classification));
    }

    let mut fields: BTreeMap<String, String> = submission.fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    for (k, v) in extract_hidden_fields(&decoded) {
        fields.insert(k, v);
    }
    fields.insert("submit".to_string(), "書き込む".to_string());
    let fields2: Vec<(&str, String)> = fields.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

    let (_status2, body2) = post_once(http, submission.url, submission.referer, &fields2, submission.write_encoding).await?;
    let decoded2 = crate::codec::decode(&body2, submission.write_encoding);
    Ok(finish(classify_post_result(&decoded2)))
}

fn finish(result_type: PostResultType) -> PostResult {
    let success = result_type == PostResultType::Ok;
    PostResult {
        success,
        result_type,
        message: format!("{result_type:?}"),
    }
}

async fn post_once(
    http: &dyn HttpBackend,
    url: &str,
    referer: &str,
    fields: &[(&str, String)],
    encoding: Encoding,
) -> Result<(u16, Vec<u8>)> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={}", form_url_encode(v, encoding)))
        .collect::<Vec<_>>()
        .join("&")
        .into_bytes();

    let mut req = HttpRequest::get(url, ProxyMode::Write);
    req.method = HttpMethod::Post;
    req.headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
    req.headers.insert("Referer".to_string(), referer.to_string());
    req.body = Some(body);

    let resp = http.fetch(&req).await?;
    Ok((resp.status, resp.body))
}
