use serde::{Deserialize, Serialize};

/// Inbound RPC payload for `bbs:post`. Crosses the trust boundary and MUST be
/// validated before crossing the RPC boundary, rather than trusted as-is
/// before use — see [`PostParams::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParams {
    pub board_url: String,
    /// Digits, or empty for a new thread.
    pub thread_id: String,
    pub name: String,
    pub mail: String,
    /// Must be non-empty.
    pub message: String,
    /// Required when `thread_id` is empty.
    pub subject: Option<String>,
}

impl PostParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.board_url.is_empty() {
            return Err("boardUrl must not be empty".to_string());
        }
        if !self.thread_id.is_empty() && !self.thread_id.chars().all(|c| c.is_ascii_digit()) {
            return Err("threadId must be digits or empty".to_string());
        }
        if self.message.is_empty() {
            return Err("message must be at least 1 character".to_string());
        }
        if self.thread_id.is_empty() {
            match &self.subject {
                Some(s) if !s.is_empty() => {}
                _ => return Err("subject is required when threadId is empty".to_string()),
            }
        }
        Ok(())
    }

    pub fn is_new_thread(&self) -> bool {
        self.thread_id.is_empty()
    }
}

/// Classification of a post-submission response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostResultType {
    Ok,
    Cookie,
    Check,
    DonguriConsumed,
    DonguriBroken,
    Error,
    /// Local gate blocked the post before any request was sent.
    SambaBlocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResult {
    pub success: bool,
    pub result_type: PostResultType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostHistoryEntry {
    pub board_url: String,
    pub thread_id: String,
    pub name: String,
    pub mail: String,
    pub message: String,
    pub posted_at: chrono::DateTime<chrono::Utc>,
    pub result_type: PostResultType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PostParams {
        PostParams {
            board_url: "https://example.5ch.net/test/".into(),
            thread_id: "1234567890".into(),
            name: String::new(),
            mail: String::new(),
            message: "hello".into(),
            subject: None,
        }
    }

    #[test]
    fn rejects_empty_message() {
        let mut p = base();
        p.message.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn requires_subject_for_new_thread() {
        let mut p = base();
        p.thread_id.clear();
        assert!(p.validate().is_err());
        p.subject = Some("new thread".into());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_non_digit_thread_id() {
        let mut p = base();
        p.thread_id = "abc".into();
        assert!(p.validate().is_err());
    }
}
