use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NgTarget {
    Board,
    Thread,
    Name,
    Id,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbonType {
    /// Render placeholder "あぼーん".
    Normal,
    /// Fully hidden.
    Transparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Plain,
    Regexp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgRule {
    pub id: String,
    pub target: NgTarget,
    pub abon_type: AbonType,
    pub match_mode: MatchMode,
    pub tokens: Vec<String>,
    pub board_id: Option<String>,
    pub thread_id: Option<String>,
    pub enabled: bool,
}

pub const NG_PLACEHOLDER: &str = "あぼーん";
