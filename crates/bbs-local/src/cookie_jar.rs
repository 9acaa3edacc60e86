//! Domain/path-scoped cookie store.

use bbs_core::cookie::{is_session_only_name, StoredCookie};
use bbs_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

type Key = (String, String, String);

#[derive(Debug, Default)]
pub struct CookieJar {
    // BTreeMap for a deterministic iteration order (insertion order is
    // tracked separately below since Rust maps don't preserve it).
    cookies: Mutex<CookieStore>,
}

#[derive(Debug, Default)]
struct CookieStore {
    by_key: BTreeMap<Key, StoredCookie>,
    insertion_order: Vec<Key>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// `setCookie(c)` replaces any existing entry with the same key.
    pub fn set_cookie(&self, mut c: StoredCookie) {
        if is_session_only_name(&c.name) {
            c.session_only = true;
        }
        let key = c.key();
        let mut store = self.lock();
        if store.by_key.insert(key.clone(), c).is_none() {
            store.insertion_order.push(key);
        }
    }

    pub fn remove_cookie(&self, domain: &str, path: &str, name: &str) {
        let key = (domain.to_string(), path.to_string(), name.to_string());
        let mut store = self.lock();
        store.by_key.remove(&key);
        store.insertion_order.retain(|k| k != &key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CookieStore> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_cookie(&self, name: &str, host: &str, now: chrono::DateTime<chrono::Utc>) -> Option<StoredCookie> {
        let store = self.lock();
        store
            .insertion_order
            .iter()
            .filter_map(|k| store.by_key.get(k))
            .find(|c| c.name == name && domain_matches(&c.domain, host) && !c.is_expired(now))
            .cloned()
    }

    /// Expired cookies are never returned, regardless of which accessor is used.
    pub fn matching(&self, host: &str, path: &str, now: chrono::DateTime<chrono::Utc>) -> Vec<StoredCookie> {
        let store = self.lock();
        store
            .insertion_order
            .iter()
            .filter_map(|k| store.by_key.get(k))
            .filter(|c| domain_matches(&c.domain, host) && path_matches(&c.path, path) && !c.is_expired(now))
            .cloned()
            .collect()
    }

    /// Concatenates all matching, non-expired cookies as `n1=v1; n2=v2; …`
    /// in insertion order.
    pub fn build_cookie_header(&self, url: &url::Url, now: chrono::DateTime<chrono::Utc>) -> Option<String> {
        let host = url.host_str()?;
        let path = url.path();
        let matches = self.matching(host, path, now);
        if matches.is_empty() {
            return None;
        }
        Some(
            matches
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Sweep expired cookies for callers that want to shrink the jar rather
    /// than just filter on read.
    pub fn sweep_expired(&self, now: chrono::DateTime<chrono::Utc>) {
        let mut store = self.lock();
        let expired: Vec<Key> = store
            .by_key
            .iter()
            .filter(|(_, c)| c.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            store.by_key.remove(&k);
            store.insertion_order.retain(|existing| existing != &k);
        }
    }

    /// Persistable snapshot: non-session, non-expired cookies only.
    pub fn persistable(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<StoredCookie> {
        let store = self.lock();
        store
            .insertion_order
            .iter()
            .filter_map(|k| store.by_key.get(k))
            .filter(|c| !c.session_only && !c.is_expired(now) && c.expires.is_some())
            .cloned()
            .collect()
    }

    /// Parses a batch of raw `Set-Cookie` header values against `request_url`
    /// and merges the results in.
    pub fn store_set_cookie_lines(&self, lines: &[String], request_url: &url::Url) {
        let now = chrono::Utc::now();
        for c in crate::parsers::set_cookie::parse_set_cookie_lines(lines, request_url, now) {
            self.set_cookie(c);
        }
    }

    pub fn load_persisted(&self, cookies: Vec<StoredCookie>) {
        let mut store = self.lock();
        for c in cookies {
            let key = c.key();
            if store.by_key.insert(key.clone(), c).is_none() {
                store.insertion_order.push(key);
            }
        }
    }
}

/// A cookie with domain `d` matches request host `h` iff:
/// - `d == h`, or
/// - `d` starts with `.` and (`h == d[1..]` or `h` ends with `d`), or
/// - `h == d` or `h` ends with `.d`.
pub fn domain_matches(d: &str, h: &str) -> bool {
    if d == h {
        return true;
    }
    if let Some(stripped) = d.strip_prefix('.') {
        if h == stripped || h.ends_with(d) {
            return true;
        }
    }
    if h.ends_with(&format!(".{d}")) {
        return true;
    }
    false
}

/// `cookiePath == "/"` matches all; otherwise `requestPath` must start with
/// `cookiePath`.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    cookie_path == "/" || request_path.starts_with(cookie_path)
}

/// Tab-separated persistence file `cookies.txt`:
/// `domain<TAB>path<TAB>name<TAB>value<TAB>expiresISO<TAB>{0|1}`.
pub fn serialize_cookies(cookies: &[StoredCookie]) -> String {
    let mut out = String::new();
    for c in cookies {
        let expires = c.expires.map(|e| e.to_rfc3339()).unwrap_or_default();
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            c.domain,
            c.path,
            c.name,
            c.value,
            expires,
            if c.secure { 1 } else { 0 }
        ));
    }
    out
}

pub fn parse_cookies_file(text: &str) -> Result<Vec<StoredCookie>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 6 {
            return Err(Error::Parse(format!("cookies.txt line {}: expected 6 fields", lineno + 1)));
        }
        let expires = if fields[4].is_empty() {
            None
        } else {
            Some(
                chrono::DateTime::parse_from_rfc3339(fields[4])
                    .map_err(|e| Error::Parse(format!("cookies.txt line {}: {e}", lineno + 1)))?
                    .with_timezone(&chrono::Utc),
            )
        };
        let name = fields[2].to_string();
        out.push(StoredCookie {
            domain: fields[0].to_string(),
            path: fields[1].to_string(),
            session_only: is_session_only_name(&name),
            name,
            value: fields[3].to_string(),
            expires,
            secure: fields[5] == "1",
        });
    }
    Ok(out)
}
