//! URL shape helpers shared across board plugins.

use bbs_core::board::Board;

/// `{serverUrl}{bbsId}/dat/{threadId}.dat`
pub fn type2ch_dat_url(board: &Board, thread_id: &str) -> String {
    format!("{}{}/dat/{}.dat", board.server_url, board.bbs_id, thread_id)
}

/// `{serverUrl}{bbsId}/kako/<first 4 digits>/{threadId}.dat?sid={session}`.
/// Past-log threads are archived under a subdirectory keyed by the first
/// four digits of the (epoch-seconds) thread id.
pub fn type2ch_oyster_url(board: &Board, thread_id: &str, uplift_session_id: &str) -> Option<String> {
    if thread_id.len() < 4 {
        return None;
    }
    let prefix = &thread_id[..4];
    Some(format!(
        "{}{}/kako/{}/{}.dat?sid={}",
        board.server_url, board.bbs_id, prefix, thread_id, uplift_session_id
    ))
}

pub fn type2ch_subject_url(board: &Board) -> String {
    format!("{}subject.txt", board.url)
}

pub fn type2ch_post_url(board: &Board) -> String {
    format!("{}test/bbs.cgi", board.server_url)
}

/// `{serverUrl}bbs/rawmode.cgi/{dir}/{bbsId}/{threadId}/[N-]`
pub fn jbbs_dat_url(board: &Board, thread_id: &str, from: Option<u32>) -> String {
    let dir = board.jbbs_dir.as_deref().unwrap_or("bbs");
    let suffix = from.map(|n| format!("{n}-")).unwrap_or_default();
    format!(
        "{}bbs/rawmode.cgi/{}/{}/{}/{}",
        board.server_url, dir, board.bbs_id, thread_id, suffix
    )
}

pub fn jbbs_post_url(board: &Board) -> String {
    let dir = board.jbbs_dir.as_deref().unwrap_or("bbs");
    format!("{}{}/write.cgi", board.server_url, dir)
}

pub fn machi_dat_url(board: &Board, thread_id: &str) -> String {
    format!("{}bbs/offlaw.cgi/{}/{}/", board.server_url, board.bbs_id, thread_id)
}

pub fn machi_post_url(board: &Board) -> String {
    format!("{}bbs/write.cgi", board.server_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::board::BoardType;

    fn board() -> Board {
        Board::new("t", "https://example.5ch.net/newsplus/", "newsplus", "https://example.5ch.net/", BoardType::TwoCh, None)
    }

    #[test]
    fn builds_2ch_dat_url() {
        assert_eq!(type2ch_dat_url(&board(), "1234567890"), "https://example.5ch.net/newsplus/dat/1234567890.dat");
    }

    #[test]
    fn builds_oyster_url_from_first_four_digits() {
        let url = type2ch_oyster_url(&board(), "1234567890", "tag:sid").unwrap();
        assert_eq!(url, "https://example.5ch.net/newsplus/kako/1234/1234567890.dat?sid=tag:sid");
    }

    #[test]
    fn oyster_url_none_for_short_thread_id() {
        assert!(type2ch_oyster_url(&board(), "12", "tag:sid").is_none());
    }

    #[test]
    fn builds_jbbs_dat_url_with_range() {
        let mut b = board();
        b.jbbs_dir = Some("book".to_string());
        assert_eq!(jbbs_dat_url(&b, "555", Some(10)), "https://example.5ch.net/book/newsplus/555/10-");
        assert_eq!(jbbs_dat_url(&b, "555", None), "https://example.5ch.net/book/newsplus/555/");
    }
}
