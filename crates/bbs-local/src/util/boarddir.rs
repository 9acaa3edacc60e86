//! Stable, injective mapping from a board URL to its on-disk cache directory.
//! Keyed the same way `FsCache` keys fetches: a content hash of the
//! identity, with a short human-readable prefix to make `ls`-ing the cache
//! dir tolerable.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub fn board_dir(data_dir: &Path, board_url: &str) -> PathBuf {
    let mut h = Sha256::new();
    h.update(board_url.as_bytes());
    let digest = hex::encode(h.finalize());

    let readable: String = board_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(40)
        .collect();

    data_dir.join("boards").join(format!("{readable}-{}", &digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_injective_for_distinct_urls() {
        let root = Path::new("/data");
        let a = board_dir(root, "https://a.5ch.net/newsplus/");
        let b = board_dir(root, "https://b.5ch.net/newsplus/");
        assert_ne!(a, b);
    }

    #[test]
    fn is_stable_for_same_url() {
        let root = Path::new("/data");
        let a1 = board_dir(root, "https://a.5ch.net/newsplus/");
        let a2 = board_dir(root, "https://a.5ch.net/newsplus/");
        assert_eq!(a1, a2);
    }
}
