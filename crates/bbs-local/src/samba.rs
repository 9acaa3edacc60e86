//! Local post-rate gate backed by `SambaTime.ini`'s `[Setting]` (per-board
//! interval seconds) and `[Send]` (per-board last-post timestamp) sections.

use crate::parsers::ini::IniDocument;
use bbs_core::{Error, Result};
use chrono::{DateTime, Utc};

pub struct SambaGate {
    doc: IniDocument,
}

const SETTING: &str = "Setting";
const SEND: &str = "Send";

impl SambaGate {
    pub fn new(doc: IniDocument) -> Self {
        Self { doc }
    }

    pub fn into_ini(self) -> IniDocument {
        self.doc
    }

    /// `[Setting]` maps a board id *or* `@boardKey` to an interval; the
    /// plain id is tried first, then the `@`-prefixed form.
    fn interval_seconds(&self, board_key: &str) -> i64 {
        self.doc
            .get(SETTING, board_key)
            .or_else(|| self.doc.get(SETTING, &format!("@{board_key}")))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
    }

    fn last_post(&self, board_key: &str) -> Option<DateTime<Utc>> {
        self.doc
            .get(SEND, board_key)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Fails fast with `RateLimited` before any HTTP request is sent when
    /// `now - lastPost < interval`. On success the caller must still invoke
    /// [`Self::record`] after the post actually succeeds.
    pub fn check(&self, board_key: &str, now: DateTime<Utc>) -> Result<()> {
        let interval = self.interval_seconds(board_key);
        if interval <= 0 {
            return Ok(());
        }
        if let Some(last) = self.last_post(board_key) {
            let elapsed = (now - last).num_seconds();
            if elapsed < interval {
                return Err(Error::RateLimited(format!(
                    "{board_key}: {elapsed}s since last post, interval is {interval}s"
                )));
            }
        }
        Ok(())
    }

    pub fn record(&mut self, board_key: &str, now: DateTime<Utc>) {
        self.doc.set(SEND, board_key, now.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn blocks_when_interval_not_elapsed() {
        let mut doc = IniDocument::default();
        let now = Utc::now();
        doc.set(SETTING, "newsplus", "40");
        doc.set(SEND, "newsplus", (now - Duration::seconds(5)).to_rfc3339());
        let gate = SambaGate::new(doc);
        assert!(gate.check("newsplus", now).is_err());
    }

    #[test]
    fn allows_after_interval_elapsed() {
        let mut doc = IniDocument::default();
        let now = Utc::now();
        doc.set(SETTING, "newsplus", "40");
        doc.set(SEND, "newsplus", (now - Duration::seconds(45)).to_rfc3339());
        let gate = SambaGate::new(doc);
        assert!(gate.check("newsplus", now).is_ok());
    }

    #[test]
    fn no_setting_means_unthrottled() {
        let gate = SambaGate::new(IniDocument::default());
        assert!(gate.check("unknown_board", Utc::now()).is_ok());
    }

    #[test]
    fn falls_back_to_at_prefixed_board_key_for_interval() {
        let mut doc = IniDocument::default();
        let now = Utc::now();
        doc.set(SETTING, "@newsplus", "40");
        doc.set(SEND, "newsplus", (now - Duration::seconds(5)).to_rfc3339());
        let gate = SambaGate::new(doc);
        assert!(gate.check("newsplus", now).is_err(), "@-prefixed Setting entry must still throttle");
    }

    #[test]
    fn plain_board_key_is_preferred_over_at_prefixed_form() {
        let mut doc = IniDocument::default();
        doc.set(SETTING, "newsplus", "40");
        doc.set(SETTING, "@newsplus", "0");
        let gate = SambaGate::new(doc);
        assert_eq!(gate.interval_seconds("newsplus"), 40);
    }

    #[test]
    fn record_then_check_round_trips() {
        let mut gate = SambaGate::new(IniDocument::default());
        gate.doc.set(SETTING, "b", "40");
        let now = Utc::now();
        gate.record("b", now);
        assert!(gate.check("b", now + Duration::seconds(1)).is_err());
        assert!(gate.check("b", now + Duration::seconds(41)).is_ok());
    }
}
