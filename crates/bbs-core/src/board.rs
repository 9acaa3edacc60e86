use serde::{Deserialize, Serialize};

/// 2channel-lineage network a [`Board`] belongs to. Drives plugin dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardType {
    #[serde(rename = "2ch")]
    TwoCh,
    MachiBBS,
    Shitaraba,
    Jbbs,
}

/// Immutable after construction. Identity is `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub title: String,
    /// Always ends with `/`.
    pub url: String,
    pub bbs_id: String,
    pub server_url: String,
    pub board_type: BoardType,
    /// Shitaraba/JBBS category directory, e.g. `"bbs"` in `rawmode.cgi/<dir>/<bbsId>/...`.
    pub jbbs_dir: Option<String>,
}

impl Board {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        bbs_id: impl Into<String>,
        server_url: impl Into<String>,
        board_type: BoardType,
        jbbs_dir: Option<String>,
    ) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self {
            title: title.into(),
            url,
            bbs_id: bbs_id.into(),
            server_url: server_url.into(),
            board_type,
            jbbs_dir,
        }
    }
}

/// A category in the parsed bbsmenu, holding an ordered sequence of boards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub boards: Vec<Board>,
}

/// Ordered sequence of categories plus a user-maintained set of external boards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BbsMenu {
    pub categories: Vec<Category>,
    pub external: Vec<Board>,
}

impl BbsMenu {
    /// A parsed menu with zero categories never overwrites a non-empty cache.
    pub fn should_replace(existing: &BbsMenu, parsed: &BbsMenu) -> bool {
        !parsed.categories.is_empty() || existing.categories.is_empty()
    }

    pub fn all_boards(&self) -> impl Iterator<Item = &Board> {
        self.categories
            .iter()
            .flat_map(|c| c.boards.iter())
            .chain(self.external.iter())
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Board> {
        self.all_boards().find(|b| b.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_url_always_ends_with_slash() {
        let b = Board::new("Test", "https://example.com/test", "test", "https://example.com/", BoardType::TwoCh, None);
        assert_eq!(b.url, "https://example.com/test/");
    }

    #[test]
    fn menu_cache_preserved_when_parsed_has_zero_categories() {
        let existing = BbsMenu {
            categories: vec![Category {
                name: "c".into(),
                boards: vec![Board::new("a", "https://a/", "a", "https://a/", BoardType::TwoCh, None)],
            }],
            external: vec![],
        };
        let parsed = BbsMenu::default();
        assert!(!BbsMenu::should_replace(&existing, &parsed));

        let empty_existing = BbsMenu::default();
        assert!(BbsMenu::should_replace(&empty_existing, &parsed));
    }
}
