//! Write-to-temp-then-rename atomic file I/O.

use bbs_core::{Error, Result};
use std::path::Path;

/// Write `contents` to `path` atomically: write to a sibling temp file in
/// the same directory, then rename onto `path`. A crash leaves either the
/// old file or the new file intact, never a partial write.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| Error::Filesystem("path has no parent".to_string()))?;
    std::fs::create_dir_all(dir)?;
    let tmp_name = format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("atomic"),
        std::process::id()
    );
    let tmp_path = dir.join(tmp_name);
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

pub async fn atomic_write_async(path: std::path::PathBuf, contents: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || atomic_write(&path, &contents))
        .await
        .map_err(|e| Error::Filesystem(format!("atomic write join failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sub").join("out.txt");
        atomic_write(&path, b"hello").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn overwrite_replaces_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
