//! The two save-on-exit channels: a UI-owned tab list and an opaque
//! session blob, each written atomically and read back verbatim. Neither
//! shape is specified beyond "durable" — the engine stores the tab list as
//! a small typed list (since `boardUrl`/`threadId` pairs are the one thing
//! every caller of this engine already has) and treats session state as an
//! opaque JSON value the host shell owns the schema of.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    pub board_url: String,
    pub thread_id: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabList {
    pub tabs: Vec<TabEntry>,
}
