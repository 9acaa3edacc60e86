//! UPLIFT session login/logout. Session-only by design: the sid cookie is
//! forced session-only by `bbs_core::cookie::is_session_only_name` and is
//! therefore never written to `cookies.txt`.

use crate::codec::{form_url_encode, Encoding};
use crate::cookie_jar::CookieJar;
use bbs_core::auth::UpliftSession;
use bbs_core::http::{HttpBackend, HttpMethod, HttpRequest};
use bbs_core::proxy::ProxyMode;
use bbs_core::Result;
use std::sync::Arc;

const LOGIN_URL: &str = "https://uplift.5ch.net/log";
const LOGIN_REFERER: &str = "https://uplift.5ch.net/login";

pub struct UpliftAuth {
    http: Arc<dyn HttpBackend>,
    cookies: Arc<CookieJar>,
}

impl UpliftAuth {
    pub fn new(http: Arc<dyn HttpBackend>, cookies: Arc<CookieJar>) -> Self {
        Self { http, cookies }
    }

    pub async fn login(&self, user: &str, password: &str, user_agent_tag: &str) -> Result<UpliftSession> {
        let body = format!(
            "usr={}&pwd={}&log=",
            form_url_encode(user, Encoding::Utf8),
            form_url_encode(password, Encoding::Utf8),
        )
        .into_bytes();

        let mut req = HttpRequest::get(LOGIN_URL, ProxyMode::Write);
        req.method = HttpMethod::Post;
        req.headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
        req.headers.insert("Referer".to_string(), LOGIN_REFERER.to_string());
        req.body = Some(body);

        self.http.fetch(&req).await?;

        let sid = self
            .cookies
            .get_cookie("sid", "uplift.5ch.net", chrono::Utc::now())
            .map(|c| c.value);

        Ok(UpliftSession {
            logged_in: sid.is_some(),
            sid,
            user_agent_tag: Some(user_agent_tag.to_string()),
        })
    }

    pub fn logout(&self) -> UpliftSession {
        self.cookies.remove_cookie("uplift.5ch.net", "/", "sid");
        UpliftSession::default()
    }
}
