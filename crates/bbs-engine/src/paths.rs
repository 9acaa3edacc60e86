//! Layout of the top-level persisted files under a single app data
//! directory. `CacheStore` already owns the per-board-directory shape
//! (`Folder.ini`/`Folder.idx`/`SambaTime.ini`/`<threadId>.dat`); this adds
//! the top-level files that sit alongside the per-board directories.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn at(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn bbsmenu_json(&self) -> PathBuf {
        self.at("bbsmenu.json")
    }

    pub fn cookies_txt(&self) -> PathBuf {
        self.at("cookies.txt")
    }

    pub fn proxy_ini(&self) -> PathBuf {
        self.at("proxy.ini")
    }

    pub fn dat_replace_ini(&self) -> PathBuf {
        self.at("dat-replace.ini")
    }

    pub fn history_json(&self) -> PathBuf {
        self.at("history.json")
    }

    pub fn favorites_json(&self) -> PathBuf {
        self.at("favorites.json")
    }

    pub fn tab_sav(&self) -> PathBuf {
        self.at("tab.sav")
    }

    pub fn session_json(&self) -> PathBuf {
        self.at("session.json")
    }

    pub fn ng_rules_json(&self) -> PathBuf {
        self.at("ng-rules.json")
    }

    pub fn post_history_json(&self) -> PathBuf {
        self.at("post-history.json")
    }

    pub fn round_board_2ch(&self) -> PathBuf {
        self.at("RoundBoard.2ch")
    }

    pub fn round_item_2ch(&self) -> PathBuf {
        self.at("RoundItem.2ch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_data_dir_for_every_persisted_file() {
        let paths = AppPaths::new("/data");
        assert_eq!(paths.bbsmenu_json(), Path::new("/data/bbsmenu.json"));
        assert_eq!(paths.cookies_txt(), Path::new("/data/cookies.txt"));
        assert_eq!(paths.proxy_ini(), Path::new("/data/proxy.ini"));
        assert_eq!(paths.round_item_2ch(), Path::new("/data/RoundItem.2ch"));
    }
}
