//! Turns the raw `<category, boards[]>` pairs the parser in
//! `bbs_local::parsers::bbsmenu` extracts out of HTML into typed
//! [`Board`]s, inferring `boardType`/`bbsId`/`serverUrl`/`jbbsDir` from the
//! board URL's host and path shape. `bbsmenu.html` itself carries no
//! explicit type tag, so this is a deliberate heuristic (see DESIGN.md);
//! it only needs to be right often enough that plugin dispatch picks the
//! correct wire format, since a wrong guess surfaces immediately as a
//! parse failure on the first fetch rather than silently.

use bbs_core::board::{Board, BoardType, Category};
use bbs_local::parsers::bbsmenu::RawCategory;

fn infer_board(url: &str, title: &str) -> Option<Board> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    let server_url = format!("{}://{}/", parsed.scheme(), host);

    if host.contains("machi") {
        let bbs_id = segments.last()?.to_string();
        return Some(Board::new(title, url, bbs_id, server_url, BoardType::MachiBBS, None));
    }
    if host.contains("shitaraba") || host.contains("jbbs") {
        if segments.len() >= 2 {
            let dir = segments[segments.len() - 2].to_string();
            let bbs_id = segments[segments.len() - 1].to_string();
            return Some(Board::new(title, url, bbs_id, server_url, BoardType::Jbbs, Some(dir)));
        }
        let bbs_id = segments.last()?.to_string();
        return Some(Board::new(title, url, bbs_id, server_url, BoardType::Jbbs, None));
    }
    let bbs_id = segments.last()?.to_string();
    Some(Board::new(title, url, bbs_id, server_url, BoardType::TwoCh, None))
}

/// Converts parsed categories into typed `Category`s, skipping any board
/// entry whose URL doesn't parse rather than failing the whole menu.
pub fn into_categories(raw: Vec<RawCategory>) -> Vec<Category> {
    raw.into_iter()
        .map(|c| Category {
            name: c.name,
            boards: c.boards.into_iter().filter_map(|b| infer_board(&b.url, &b.title)).collect(),
        })
        .collect()
}

/// Board-transfer heuristic (§9 Open Questions: "host-only change, same
/// path"): a board in `old` and a board in `new` with identical `bbsId` and
/// identical URL path but a different host are treated as the same board
/// having moved servers. Returns `(old_url, new_url)` pairs for every
/// detected transfer so the caller can rewrite its per-board cache
/// directory before swapping the cached menu in.
pub fn detect_transfers<'a>(old: impl Iterator<Item = &'a Board>, new: impl Iterator<Item = &'a Board>) -> Vec<(String, String)> {
    let olds: Vec<&Board> = old.collect();
    let news: Vec<&Board> = new.collect();
    let mut transfers = Vec::new();
    for n in &news {
        if olds.iter().any(|o| o.url == n.url) {
            continue;
        }
        if let Some(o) = olds.iter().find(|o| o.bbs_id == n.bbs_id && url_path(&o.url) == url_path(&n.url) && o.url != n.url) {
            transfers.push((o.url.clone(), n.url.clone()));
        }
    }
    transfers
}

fn url_path(u: &str) -> Option<String> {
    url::Url::parse(u).ok().map(|parsed| parsed.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_twoch_board_from_5ch_host() {
        let b = infer_board("https://example.5ch.net/newsplus/", "News").unwrap();
        assert_eq!(b.board_type, BoardType::TwoCh);
        assert_eq!(b.bbs_id, "newsplus");
        assert_eq!(b.server_url, "https://example.5ch.net/");
    }

    #[test]
    fn infers_machi_board_from_machi_host() {
        let b = infer_board("https://machi.to/bbs/hobby/", "Hobby").unwrap();
        assert_eq!(b.board_type, BoardType::MachiBBS);
        assert_eq!(b.bbs_id, "hobby");
    }

    #[test]
    fn infers_jbbs_board_with_dir_from_path_shape() {
        let b = infer_board("https://jbbs.shitaraba.net/bbs/12345/", "Board").unwrap();
        assert_eq!(b.board_type, BoardType::Jbbs);
        assert_eq!(b.jbbs_dir.as_deref(), Some("bbs"));
        assert_eq!(b.bbs_id, "12345");
    }

    #[test]
    fn detects_host_only_transfer_with_matching_bbs_id_and_path() {
        let old = Board::new("News", "https://old.5ch.net/newsplus/", "newsplus", "https://old.5ch.net/", BoardType::TwoCh, None);
        let new = Board::new("News", "https://new.5ch.net/newsplus/", "newsplus", "https://new.5ch.net/", BoardType::TwoCh, None);
        let transfers = detect_transfers(std::iter::once(&old), std::iter::once(&new));
        assert_eq!(transfers, vec![(old.url.clone(), new.url.clone())]);
    }

    #[test]
    fn no_transfer_when_bbs_id_differs() {
        let old = Board::new("News", "https://old.5ch.net/newsplus/", "newsplus", "https://old.5ch.net/", BoardType::TwoCh, None);
        let new = Board::new("News", "https://new.5ch.net/livejupiter/", "livejupiter", "https://new.5ch.net/", BoardType::TwoCh, None);
        let transfers = detect_transfers(std::iter::once(&old), std::iter::once(&new));
        assert!(transfers.is_empty());
    }

    #[test]
    fn no_transfer_when_url_is_unchanged() {
        let board = Board::new("News", "https://a.5ch.net/newsplus/", "newsplus", "https://a.5ch.net/", BoardType::TwoCh, None);
        let transfers = detect_transfers(std::iter::once(&board), std::iter::once(&board));
        assert!(transfers.is_empty());
    }

    #[test]
    fn skips_unparseable_urls_instead_of_failing_the_menu() {
        let raw = vec![RawCategory {
            name: "cat".to_string(),
            boards: vec![bbs_local::parsers::bbsmenu::RawBoardEntry { url: "not a url".to_string(), title: "x".to_string() }],
        }];
        let cats = into_categories(raw);
        assert_eq!(cats.len(), 1);
        assert!(cats[0].boards.is_empty());
    }
}
