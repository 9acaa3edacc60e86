use crate::post::PostHistoryEntry;
use serde::{Deserialize, Serialize};

pub const BROWSING_HISTORY_CAP: usize = 200;
pub const POST_HISTORY_CAP: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingHistoryEntry {
    pub board_url: String,
    pub thread_id: String,
    pub title: String,
    pub visited_at: chrono::DateTime<chrono::Utc>,
}

/// Newest-first list capped at [`BROWSING_HISTORY_CAP`]. `add` dedupes on
/// `(boardUrl, threadId)` by removing any prior entry before prepending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowsingHistory {
    pub entries: Vec<BrowsingHistoryEntry>,
}

impl BrowsingHistory {
    pub fn add(&mut self, board_url: String, thread_id: String, title: String, now: chrono::DateTime<chrono::Utc>) {
        self.entries
            .retain(|e| !(e.board_url == board_url && e.thread_id == thread_id));
        self.entries.insert(
            0,
            BrowsingHistoryEntry {
                board_url,
                thread_id,
                title,
                visited_at: now,
            },
        );
        self.entries.truncate(BROWSING_HISTORY_CAP);
    }
}

/// Append-only, newest-last, capped at [`POST_HISTORY_CAP`]. Unlike
/// [`BrowsingHistory`], entries are never deduplicated or reordered — a
/// resubmission of the same thread is a distinct event worth keeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostHistory {
    pub entries: Vec<PostHistoryEntry>,
}

impl PostHistory {
    pub fn add(&mut self, entry: PostHistoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > POST_HISTORY_CAP {
            let overflow = self.entries.len() - POST_HISTORY_CAP;
            self.entries.drain(0..overflow);
        }
    }
}
