//! Be (5ch premium account) login/logout and profile-URL helpers.

use crate::codec::{form_url_encode, Encoding};
use crate::cookie_jar::CookieJar;
use bbs_core::auth::{BeId, BeSession};
use bbs_core::http::{HttpBackend, HttpMethod, HttpRequest};
use bbs_core::proxy::ProxyMode;
use bbs_core::Result;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const LOGIN_URL: &str = "https://be.5ch.net/log";
const COOKIE_DOMAIN: &str = ".5ch.net";

pub struct BeAuth {
    http: Arc<dyn HttpBackend>,
    cookies: Arc<CookieJar>,
}

impl BeAuth {
    pub fn new(http: Arc<dyn HttpBackend>, cookies: Arc<CookieJar>) -> Self {
        Self { http, cookies }
    }

    pub async fn login(&self, mail: &str, pass: &str) -> Result<BeSession> {
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
        self.http.fetch(&req).await?;

        Ok(self.session())
    }

    pub fn logout(&self) -> BeSession {
        self.cookies.remove_cookie(COOKIE_DOMAIN, "/", "DMDM");
        self.cookies.remove_cookie(COOKIE_DOMAIN, "/", "MDMD");
        BeSession::default()
    }

    /// Logged-in iff both `DMDM` and `MDMD` are present and unexpired.
    pub fn session(&self) -> BeSession {
        let now = chrono::Utc::now();
        let dmdm = self.cookies.get_cookie("DMDM", "be.5ch.net", now).is_some();
        let mdmd = self.cookies.get_cookie("MDMD", "be.5ch.net", now).is_some();
        BeSession { logged_in: dmdm && mdmd }
    }
}

fn be_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"BE:(\d+)-(\d+)").unwrap())
}

/// Finds `BE:<digits>-<digits>` anywhere in the given datetime field text.
pub fn parse_be_id(date_time_field: &str) -> Option<BeId> {
    let caps = be_id_pattern().captures(date_time_field)?;
    Some(BeId {
        be_id: caps[1].parse().ok()?,
        be_level: caps[2].parse().ok()?,
    })
}

pub fn build_be_profile_url(be_id: u64, res_number: u32) -> String {
    format!("https://be.5ch.net/test/p.php?i={be_id}/{res_number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_be_id_from_datetime_field() {
        let field = "2024/01/15(月) 12:34:56.78 ID:AbCdEfGh0 BE:123456789-12345";
        let id = parse_be_id(field).unwrap();
        assert_eq!(id.be_id, 123456789);
        assert_eq!(id.be_level, 12345);
    }

    #[test]
    fn no_be_id_returns_none() {
        assert!(parse_be_id("no marker here").is_none());
    }

    #[test]
    fn builds_profile_url() {
        assert_eq!(build_be_profile_url(123, 5), "https://be.5ch.net/test/p.php?i=123/5");
    }
}
