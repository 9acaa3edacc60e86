//! Masked logging ring buffer. This is the engine's only
//! logging surface: every emitted message passes through the mask before a
//! diagnostics consumer (`diag:get-logs`) can see it. There is no separate
//! `tracing`/`log` facade layered in front of it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;
use std::sync::Mutex;

pub const RING_CAPACITY: usize = 1_000;
const MASK: &str = "***MASKED***";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
}

fn mask_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(cookie|sid|acorn|DMDM|MDMD|password)([=:])([^\s&;]+)").unwrap()
    })
}

/// Scan `message` for `(cookie|sid|acorn|DMDM|MDMD|password)[=:]<value>` and
/// replace the value segment with `***MASKED***`.
pub fn mask(message: &str) -> String {
    mask_pattern()
        .replace_all(message, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], &caps[2], MASK)
        })
        .into_owned()
}

#[derive(Debug, Default)]
pub struct MaskedLogger {
    ring: Mutex<VecDeque<LogEntry>>,
}

impl MaskedLogger {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn log(&self, now: chrono::DateTime<chrono::Utc>, level: LogLevel, tag: impl Into<String>, message: impl AsRef<str>) {
        let entry = LogEntry {
            timestamp: now,
            level,
            tag: tag.into(),
            message: mask(message.as_ref()),
        };
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        if ring.len() >= RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn masks_known_sensitive_keys() {
        assert_eq!(mask("sid=abc123"), "sid=***MASKED***");
        assert_eq!(mask("Cookie: DMDM=xyz"), "Cookie: DMDM=***MASKED***");
        assert_eq!(mask("password:hunter2"), "password:***MASKED***");
        assert_eq!(mask("acorn=abcd"), "acorn=***MASKED***");
    }

    #[test]
    fn leaves_unrelated_text_untouched() {
        assert_eq!(mask("fetched board=newsplus count=3"), "fetched board=newsplus count=3");
    }

    #[test]
    fn ring_buffer_evicts_oldest_on_overflow() {
        let logger = MaskedLogger::new();
        let t = chrono::Utc.timestamp_opt(0, 0).unwrap();
        for i in 0..(RING_CAPACITY + 5) {
            logger.log(t, LogLevel::Info, "test", format!("msg {i}"));
        }
        let entries = logger.entries();
        assert_eq!(entries.len(), RING_CAPACITY);
        assert_eq!(entries[0].message, "msg 5");
    }
}
