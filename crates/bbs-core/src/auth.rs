use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpliftSession {
    pub logged_in: bool,
    pub sid: Option<String>,
    pub user_agent_tag: Option<String>,
}

impl UpliftSession {
    /// Session id used in URLs is `<UserAgent>:<sid>`.
    pub fn session_id(&self) -> Option<String> {
        let sid = self.sid.as_ref()?;
        let tag = self.user_agent_tag.as_deref().unwrap_or("");
        Some(format!("{tag}:{sid}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeSession {
    pub logged_in: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonguriState {
    pub has_acorn: bool,
    pub last_checked: Option<chrono::DateTime<chrono::Utc>>,
    pub last_result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub uplift: UpliftSession,
    pub be: BeSession,
    pub donguri: DonguriState,
}

/// Parsed `BE:<digits>-<digits>` Be profile identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeId {
    pub be_id: u64,
    pub be_level: u32,
}
