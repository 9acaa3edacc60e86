use serde::{Deserialize, Serialize};

/// One row of an upstream `subject.txt`. Ordering within the parsed `Vec` is
/// meaningful (board-defined ranking) — do not re-sort it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// `"<digits>.dat"`.
    pub file_name: String,
    pub title: String,
    pub count: u32,
}

impl SubjectRecord {
    pub fn thread_id(&self) -> &str {
        self.file_name.strip_suffix(".dat").unwrap_or(&self.file_name)
    }
}

/// A single response (post) within a thread. `number` is 1-based and equals
/// the line index in the canonical DAT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Res {
    pub number: u32,
    pub name: String,
    pub mail: String,
    pub date_time: String,
    pub body: String,
    /// Populated only on res #1; empty otherwise.
    pub title: String,
    /// Populated only for 7-field (JBBS) format.
    pub id: Option<String>,
}

/// `ageSage` marker on a [`ThreadIndex`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AgeSage {
    /// Unset / not yet posted to from this client.
    Unset = 0,
    Age = 1,
    Sage = 2,
    /// "Sage" submitted but thread was bumped anyway (server-observed mismatch).
    SageMismatch = 3,
    /// Thread is 1000-capped / dead; posting no longer changes bump order.
    Dead = 4,
}

/// `Folder.idx` row: per-thread persistent cache metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadIndex {
    pub no: u32,
    pub file_name: String,
    pub title: String,
    pub count: u32,
    /// Byte length of the on-disk DAT after last successful fetch.
    pub size: u64,
    pub round_date: Option<chrono::DateTime<chrono::Utc>>,
    pub last_modified: Option<String>,
    /// "Read up to this response number" marker. -1 = unread.
    pub kokomade: i32,
    pub new_receive: bool,
    pub un_read: bool,
    pub scroll_top: i32,
    pub scroll_res_number: i32,
    pub scroll_res_offset: i32,
    pub all_res_count: u32,
    pub new_res_count: u32,
    pub age_sage: AgeSage,
}

impl ThreadIndex {
    pub fn thread_id(&self) -> &str {
        self.file_name.strip_suffix(".dat").unwrap_or(&self.file_name)
    }

    /// `kokomade` must never exceed `allResCount`.
    pub fn check_invariants(&self) -> bool {
        self.kokomade <= self.all_res_count as i32
    }
}
