use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyMode {
    Read,
    Write,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
    pub user_id: String,
    pub password: String,
}

impl ProxyEndpoint {
    /// An endpoint is active when `enabled ∧ address≠"" ∧ port>0`.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.address.is_empty() && self.port > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub read: ProxyEndpoint,
    pub write: ProxyEndpoint,
}

impl ProxyConfig {
    pub fn endpoint(&self, mode: ProxyMode) -> &ProxyEndpoint {
        match mode {
            ProxyMode::Read => &self.read,
            ProxyMode::Write => &self.write,
        }
    }
}
