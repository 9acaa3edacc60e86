//! `RoundBoard.2ch` / `RoundItem.2ch`: the round scheduler's registration
//! lists. Both share one line-oriented shape: a version header line
//! (`2.00`), a `#1` separator, then one entry per line.

use bbs_core::{Error, Result};

const HEADER: &str = "2.00";
const SEPARATOR: &str = "#1";

/// `RoundBoard.2ch`: one board URL per line.
pub fn serialize_board_list(urls: &[String]) -> String {
    let mut out = format!("{HEADER}\n{SEPARATOR}\n");
    for url in urls {
        out.push_str(url);
        out.push('\n');
    }
    out
}

pub fn parse_board_list(text: &str) -> Result<Vec<String>> {
    Ok(body_lines(text)?.map(|l| l.to_string()).collect())
}

/// `RoundItem.2ch`: one registered thread per line, `boardUrl<TAB>threadId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundItemEntry {
    pub board_url: String,
    pub thread_id: String,
}

pub fn serialize_item_list(items: &[RoundItemEntry]) -> String {
    let mut out = format!("{HEADER}\n{SEPARATOR}\n");
    for item in items {
        out.push_str(&item.board_url);
        out.push('\t');
        out.push_str(&item.thread_id);
        out.push('\n');
    }
    out
}

pub fn parse_item_list(text: &str) -> Result<Vec<RoundItemEntry>> {
    body_lines(text)?
        .map(|line| {
            let (board_url, thread_id) = line
                .split_once('\t')
                .ok_or_else(|| Error::Parse(format!("RoundItem.2ch line missing TAB: {line:?}")))?;
            Ok(RoundItemEntry {
                board_url: board_url.to_string(),
                thread_id: thread_id.to_string(),
            })
        })
        .collect()
}

fn body_lines(text: &str) -> Result<impl Iterator<Item = &str>> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default().trim();
    if header != HEADER {
        return Err(Error::Parse(format!("expected header {HEADER:?}, got {header:?}")));
    }
    let sep = lines.next().unwrap_or_default().trim();
    if sep != SEPARATOR {
        return Err(Error::Parse(format!("expected separator {SEPARATOR:?}, got {sep:?}")));
    }
    Ok(lines.filter(|l| !l.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_board_list() {
        let urls = vec!["https://a.5ch.net/newsplus/".to_string(), "https://b.5ch.net/hobby/".to_string()];
        let text = serialize_board_list(&urls);
        assert!(text.starts_with("2.00\n#1\n"));
        assert_eq!(parse_board_list(&text).unwrap(), urls);
    }

    #[test]
    fn round_trips_item_list() {
        let items = vec![RoundItemEntry {
            board_url: "https://a.5ch.net/newsplus/".to_string(),
            thread_id: "1234567890".to_string(),
        }];
        let text = serialize_item_list(&items);
        assert_eq!(parse_item_list(&text).unwrap(), items);
    }

    #[test]
    fn empty_list_round_trips() {
        let text = serialize_board_list(&[]);
        assert!(parse_board_list(&text).unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_header() {
        assert!(parse_board_list("not-a-header\n#1\n").is_err());
    }

    #[test]
    fn rejects_item_line_without_tab() {
        assert!(parse_item_list("2.00\n#1\nno-tab-here\n").is_err());
    }
}
