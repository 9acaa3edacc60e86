//! JSON load/save wrappers for `history.json` (browsing) and
//! `post-history.json` (post), mirroring [`crate::favorites`]'s load/save
//! pair for favorites.json.

use bbs_core::history::{BrowsingHistory, PostHistory};
use bbs_core::{Error, Result};

pub fn load_browsing(text: &str) -> Result<BrowsingHistory> {
    serde_json::from_str(text).map_err(|e| Error::Parse(format!("history.json: {e}")))
}

pub fn save_browsing(history: &BrowsingHistory) -> Result<String> {
    serde_json::to_string_pretty(history).map_err(|e| Error::Parse(format!("history.json: {e}")))
}

pub fn load_post(text: &str) -> Result<PostHistory> {
    serde_json::from_str(text).map_err(|e| Error::Parse(format!("post-history.json: {e}")))
}

pub fn save_post(history: &PostHistory) -> Result<String> {
    serde_json::to_string_pretty(history).map_err(|e| Error::Parse(format!("post-history.json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::post::{PostHistoryEntry, PostResultType};
    use chrono::TimeZone;

    #[test]
    fn browsing_history_round_trips_through_json() {
        let mut history = BrowsingHistory::default();
        history.add(
            "https://example.5ch.net/test/".into(),
            "1234567890".into(),
            "a thread".into(),
            chrono::Utc.timestamp_opt(1, 0).unwrap(),
        );
        let text = save_browsing(&history).unwrap();
        let loaded = load_browsing(&text).unwrap();
        assert_eq!(loaded.entries, history.entries);
    }

    #[test]
    fn post_history_round_trips_through_json() {
        let mut history = PostHistory::default();
        history.add(PostHistoryEntry {
            board_url: "https://example.5ch.net/test/".into(),
            thread_id: "1234567890".into(),
            name: String::new(),
            mail: String::new(),
            message: "hello".into(),
            posted_at: chrono::Utc.timestamp_opt(2, 0).unwrap(),
            result_type: PostResultType::Ok,
        });
        let text = save_post(&history).unwrap();
        let loaded = load_post(&text).unwrap();
        assert_eq!(loaded.entries, history.entries);
    }

    #[test]
    fn load_rejects_malformed_json() {
        assert!(load_browsing("not json").is_err());
        assert!(load_post("not json").is_err());
    }
}
