use serde::{Deserialize, Serialize};

/// A single stored cookie, keyed by `(domain, path, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: Option<chrono::DateTime<chrono::Utc>>,
    pub secure: bool,
    /// Set when `name` is in the known-session-only set, regardless of
    /// server-sent attributes (UPLIFT `sid`, transient login tokens).
    pub session_only: bool,
}

impl StoredCookie {
    pub fn key(&self) -> (String, String, String) {
        (self.domain.clone(), self.path.clone(), self.name.clone())
    }

    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.expires {
            Some(exp) => exp < now,
            None => false,
        }
    }
}

/// Closed set of cookie names that are always treated as session-only,
/// regardless of what the server's Set-Cookie attributes claim — modeled
/// as an explicit table rather than magic strings scattered at call sites.
pub const SESSION_ONLY_COOKIE_NAMES: &[&str] = &["sid"];

pub fn is_session_only_name(name: &str) -> bool {
    SESSION_ONLY_COOKIE_NAMES.contains(&name)
}
