//! Per-board on-disk cache: `Folder.idx` rows, `<threadId>.dat` files, and
//! the differential-fetch bookkeeping (§4.H) that ties HTTP Range/If-
//! Modified-Since fetches to what is already on disk.

use super::dat_replace::{self, ReplaceRule};
use crate::parsers::folder_idx;
use crate::util::{atomic_write, boarddir};
use bbs_core::plugin::{DatFetchResult, DatFetchStatus};
use bbs_core::thread::{Res, ThreadIndex};
use bbs_core::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Emitted when an HTTP 416 forces the cache to discard a thread's cached
/// DAT and start over on the next fetch.
#[derive(Debug, Clone)]
pub struct CorruptionNotice {
    pub thread_id: String,
    pub quarantined_path: PathBuf,
}

pub struct CacheStore {
    data_dir: PathBuf,
}

impl CacheStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn board_dir(&self, board_url: &str) -> PathBuf {
        boarddir::board_dir(&self.data_dir, board_url)
    }

    pub fn dat_path(&self, board_url: &str, thread_id: &str) -> PathBuf {
        self.board_dir(board_url).join(format!("{thread_id}.dat"))
    }

    pub fn idx_path(&self, board_url: &str) -> PathBuf {
        self.board_dir(board_url).join("Folder.idx")
    }

    pub fn folder_ini_path(&self, board_url: &str) -> PathBuf {
        self.board_dir(board_url).join("Folder.ini")
    }

    pub fn samba_ini_path(&self, board_url: &str) -> PathBuf {
        self.board_dir(board_url).join("SambaTime.ini")
    }

    pub fn dat_size(&self, board_url: &str, thread_id: &str) -> u64 {
        std::fs::metadata(self.dat_path(board_url, thread_id)).map(|m| m.len()).unwrap_or(0)
    }

    /// Invariant 1: at most one `Folder.idx` row per thread. Missing file
    /// reads as an empty cache, not an error.
    pub fn load_index(&self, board_url: &str) -> Result<Vec<ThreadIndex>> {
        match std::fs::read_to_string(self.idx_path(board_url)) {
            Ok(text) => folder_idx::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_index(&self, board_url: &str, rows: &[ThreadIndex]) -> Result<()> {
        atomic_write::atomic_write(&self.idx_path(board_url), folder_idx::serialize(rows).as_bytes())
    }

    /// Derives `(range_from, if_modified_since)` for the next fetch of a
    /// thread from what is already cached on disk. No cached bytes means a
    /// plain, unconditional fetch.
    pub fn differential_params(&self, board_url: &str, thread_id: &str, index: Option<&ThreadIndex>) -> (Option<u64>, Option<String>) {
        let size = self.dat_size(board_url, thread_id);
        if size == 0 {
            return (None, None);
        }
        (Some(size), index.and_then(|i| i.last_modified.clone()))
    }

    /// Renames `<threadId>.dat` aside so the next fetch starts from empty
    /// rather than resuming from bytes the server says are out of range.
    fn quarantine_corrupt(&self, path: &Path) -> Result<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }
        let quarantined = path.with_extension("dat.corrupt");
        std::fs::rename(path, &quarantined)?;
        Ok(Some(quarantined))
    }

    /// Applies one `DatFetchResult` to the on-disk DAT file for
    /// `(board_url, thread_id)`, then re-reads and re-parses the full file
    /// (after `replace_rules`) so the caller always gets the complete,
    /// current thread back regardless of whether this fetch was a full
    /// replace, a partial append, or a no-op.
    ///
    /// `decode` turns the stored wire bytes into text in the board's read
    /// charset; `parse` turns that text into `Res`s in the board's DAT
    /// field layout (5-field vs 7-field). Both are supplied by the caller
    /// because this store is charset/format-agnostic.
    pub fn apply_dat_fetch(
        &self,
        board_url: &str,
        thread_id: &str,
        result: &DatFetchResult,
        replace_rules: &[ReplaceRule],
        decode: impl Fn(&[u8]) -> String,
        parse: impl Fn(&str) -> Vec<Res>,
        mut index_row: ThreadIndex,
    ) -> Result<(Vec<Res>, ThreadIndex, Option<CorruptionNotice>)> {
        let path = self.dat_path(board_url, thread_id);
        let mut corruption = None;

        match result.status {
            DatFetchStatus::NotModified => {}
            DatFetchStatus::RangeUnsatisfiable => {
                if let Some(quarantined) = self.quarantine_corrupt(&path)? {
                    corruption = Some(CorruptionNotice { thread_id: thread_id.to_string(), quarantined_path: quarantined });
                }
                index_row.size = 0;
            }
            DatFetchStatus::Full => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                atomic_write::atomic_write(&path, &result.raw_body)?;
                index_row.size = result.raw_body.len() as u64;
            }
            DatFetchStatus::Partial => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                let mut f = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
                f.write_all(&result.raw_body)?;
                index_row.size += result.raw_body.len() as u64;
            }
        }

        if let Some(lm) = &result.last_modified {
            index_row.last_modified = Some(lm.clone());
        }

        let on_disk = if index_row.size == 0 { Vec::new() } else { std::fs::read(&path)? };
        let text = decode(&on_disk);
        let replaced = dat_replace::apply(&text, replace_rules);
        let responses = parse(&replaced);

        let previous_count = index_row.all_res_count;
        index_row.all_res_count = responses.len() as u32;
        index_row.count = responses.len() as u32;
        index_row.new_res_count = (responses.len() as u32).saturating_sub(previous_count);
        if let Some(first) = responses.first() {
            if !first.title.is_empty() {
                index_row.title = first.title.clone();
            }
        }

        Ok((responses, index_row, corruption))
    }

    /// Board transfer (host-only URL change, same path, same `bbsId`):
    /// renames the per-board cache directory so cached DATs and the index
    /// survive under the new identity.
    pub fn transfer_board(&self, old_url: &str, new_url: &str) -> Result<()> {
        let old_dir = self.board_dir(old_url);
        let new_dir = self.board_dir(new_url);
        if !old_dir.exists() {
            return Ok(());
        }
        if let Some(parent) = new_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(old_dir, new_dir)?;
        Ok(())
    }
}
