//! `subject.txt` parser.

use crate::util::html_entities::decode_entities;
use bbs_core::thread::SubjectRecord;
use regex::Regex;
use std::sync::OnceLock;

fn modern_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+\.dat)\t(.*?)\s*\((\d+)\)\s*$").unwrap())
}

fn legacy_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\.dat,(.*?)\((\d+)\)\s*$").unwrap())
}

/// Parse one line. Returns `None` for a line that matches neither the
/// modern tab-separated format nor the legacy comma-separated format —
/// invalid lines are skipped by the caller, not an error.
pub fn parse_line(line: &str) -> Option<SubjectRecord> {
    if let Some(caps) = modern_line_pattern().captures(line) {
        return Some(SubjectRecord {
            file_name: caps[1].to_string(),
            title: decode_entities(caps[2].trim()),
            count: caps[3].parse().ok()?,
        });
    }
    if let Some(caps) = legacy_line_pattern().captures(line) {
        return Some(SubjectRecord {
            file_name: format!("{}.dat", &caps[1]),
            title: decode_entities(caps[2].trim()),
            count: caps[3].parse().ok()?,
        });
    }
    None
}

/// Parse a full `subject.txt` body. Upstream ordering is preserved and is
/// meaningful (board-defined ranking) — never sorted here.
pub fn parse(body: &str) -> Vec<SubjectRecord> {
    body.lines().filter_map(parse_line).collect()
}
