//! `Set-Cookie` header parsing.

use bbs_core::cookie::{is_session_only_name, StoredCookie};

/// Parse the HTTP-date format used by `Expires` (RFC 7231 IMF-fixdate, e.g.
/// `Wed, 21 Oct 2015 07:28:00 GMT`), falling back to the two legacy formats
/// RFC 7231 §7.1.1.1 still requires servers to accept.
fn parse_http_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.trim();
    for fmt in [
        "%a, %d %b %Y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
        "%a %b %e %H:%M:%S %Y",
    ] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(chrono::DateTime::from_naive_utc_and_offset(naive, chrono::Utc));
        }
    }
    None
}

/// Recognized attributes: `Domain`, `Path`, `Expires`, `Max-Age`, `Secure`.
/// Missing Domain/Path default to `request_url`'s host/path. `now` is used
/// to resolve `Max-Age` (seconds from now).
pub fn parse_one_set_cookie(
    header_value: &str,
    request_url: &url::Url,
    now: chrono::DateTime<chrono::Utc>,
) -> Option<StoredCookie> {
    let mut parts = header_value.split(';');
    let first = parts.next()?.trim();
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() {
        return None;
    }

    let mut domain = request_url.host_str()?.to_string();
    let mut path = {
        let p = request_url.path();
        if let Some(idx) = p.rfind('/') {
            if idx == 0 { "/".to_string() } else { p[..idx].to_string() }
        } else {
            "/".to_string()
        }
    };
    let mut expires: Option<chrono::DateTime<chrono::Utc>> = None;
    let mut max_age: Option<i64> = None;
    let mut secure = false;

    for attr in parts {
        let attr = attr.trim();
        if attr.is_empty() {
            continue;
        }
        let (k, v) = attr.split_once('=').unwrap_or((attr, ""));
        match k.trim().to_ascii_lowercase().as_str() {
            "domain" => {
                let v = v.trim();
                if !v.is_empty() {
                    domain = v.to_string();
                }
            }
            "path" => {
                let v = v.trim();
                if !v.is_empty() {
                    path = v.to_string();
                }
            }
            "expires" => {
                expires = parse_http_date(v.trim());
            }
            "max-age" => {
                max_age = v.trim().parse::<i64>().ok();
            }
            "secure" => secure = true,
            _ => {}
        }
    }

    // Max-Age takes precedence over Expires when both are present.
    let resolved_expires = match max_age {
        Some(secs) => Some(now + chrono::Duration::seconds(secs)),
        None => expires,
    };

    Some(StoredCookie {
        session_only: is_session_only_name(name),
        name: name.to_string(),
        value: value.to_string(),
        domain,
        path,
        expires: resolved_expires,
        secure,
    })
}

/// The HTTP component may deliver `Set-Cookie` as one concatenated string
/// (comma-joined, each new entry starting with `<name>=`) or as a list of
/// raw header lines; this accepts the list form, which is unambiguous.
pub fn parse_set_cookie_lines(
    lines: &[String],
    request_url: &url::Url,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<StoredCookie> {
    lines
        .iter()
        .filter_map(|l| parse_one_set_cookie(l, request_url, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.timestamp_opt(s, 0).unwrap()
    }

    #[test]
    fn parses_domain_path_expires_secure() {
        let url = url::Url::parse("https://be.5ch.net/log").unwrap();
        let c = parse_one_set_cookie(
            "DMDM=abc123; Domain=.5ch.net; Path=/; Expires=Wed, 21 Oct 2035 07:28:00 GMT; Secure",
            &url,
            t(0),
        )
        .unwrap();
        assert_eq!(c.name, "DMDM");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.domain, ".5ch.net");
        assert_eq!(c.path, "/");
        assert!(c.secure);
        assert!(c.expires.is_some());
    }

    #[test]
    fn max_age_zero_is_immediately_expired() {
        let url = url::Url::parse("https://uplift.5ch.net/log").unwrap();
        let now = t(1_000_000);
        let c = parse_one_set_cookie("sid=xyz; Max-Age=0", &url, now).unwrap();
        assert!(c.is_expired(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn missing_domain_and_path_default_from_request_url() {
        let url = url::Url::parse("https://uplift.5ch.net/login/step1").unwrap();
        let c = parse_one_set_cookie("sid=xyz", &url, t(0)).unwrap();
        assert_eq!(c.domain, "uplift.5ch.net");
        assert_eq!(c.path, "/login");
    }

    #[test]
    fn sid_is_forced_session_only_regardless_of_attributes() {
        let url = url::Url::parse("https://uplift.5ch.net/log").unwrap();
        let c = parse_one_set_cookie(
            "sid=xyz; Expires=Wed, 21 Oct 2035 07:28:00 GMT",
            &url,
            t(0),
        )
        .unwrap();
        assert!(c.session_only);
    }
}
