//! Resumable result cache.
//!
//! On disk the cache is a sequence of JSON fragments, one per line, each a
//! map of url → result. New results are appended as fresh fragments of at
//! most `flush_size` keys, so a crash loses only what was never flushed.
//! Loading replays fragments in order and stops at the first one that does
//! not parse.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use tempfile::NamedTempFile;

use faultscan_core::errors::StorageError;
use faultscan_core::RepositoryResult;

type Fragment = FxHashMap<String, RepositoryResult>;

/// How the cache file looked when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No cache file yet.
    Missing,
    /// Every fragment parsed.
    Clean,
    /// The last fragment was cut short; earlier fragments were kept.
    TruncatedTail,
    /// A fragment was not valid; fragments before it were kept.
    Corrupt,
    /// The file could not be read at all.
    Unreadable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub state: LoadState,
    pub fragments: usize,
    pub entries: usize,
    /// Keys that appeared in more than one fragment.
    pub redundant_keys: usize,
}

impl LoadReport {
    fn needs_compaction(&self) -> bool {
        matches!(self.state, LoadState::TruncatedTail | LoadState::Corrupt) || self.redundant_keys > 0
    }
}

/// Outcome of folding one batch into the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub replaced: usize,
    /// Failed units; their prior entries, if any, are left alone.
    pub skipped: usize,
}

#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: FxHashMap<String, RepositoryResult>,
    dirty: Vec<String>,
    dirty_set: FxHashSet<String>,
    flush_size: usize,
    /// A failed append may have left a partial line behind.
    torn: bool,
}

impl ResultCache {
    /// Load the cache at `path`. Never fails: an unreadable or corrupt file
    /// yields whatever prefix could be recovered, possibly nothing.
    pub fn load(path: &Path, flush_size: usize) -> (Self, LoadReport) {
        let mut cache = Self::empty(path, flush_size);
        let report = cache.replay();

        match report.state {
            LoadState::Missing => {
                tracing::info!(path = %path.display(), "no result cache yet, starting empty");
            }
            LoadState::Clean => {
                tracing::info!(path = %path.display(), entries = report.entries, fragments = report.fragments, "result cache loaded");
            }
            LoadState::TruncatedTail => {
                tracing::warn!(path = %path.display(), entries = report.entries, fragments = report.fragments, "result cache has a truncated tail, keeping complete fragments");
            }
            LoadState::Corrupt if report.fragments == 0 => {
                tracing::warn!(path = %path.display(), "result cache is corrupt, starting empty");
            }
            LoadState::Corrupt => {
                tracing::warn!(path = %path.display(), entries = report.entries, fragments = report.fragments, "result cache has a corrupt fragment, keeping the fragments before it");
            }
            LoadState::Unreadable => {
                tracing::warn!(path = %path.display(), "result cache unreadable, starting empty");
            }
        }

        if report.state == LoadState::Corrupt {
            preserve_corrupt(path);
        }
        if report.needs_compaction() {
            if let Err(e) = cache.compact() {
                tracing::warn!(path = %path.display(), error = %e, "cache compaction failed");
            }
        }
        (cache, report)
    }

    /// An empty cache that will write to `path`. Nothing is read.
    pub fn empty(path: &Path, flush_size: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: FxHashMap::default(),
            dirty: Vec::new(),
            dirty_set: FxHashSet::default(),
            flush_size: flush_size.max(1),
            torn: false,
        }
    }

    fn replay(&mut self) -> LoadReport {
        let mut report = LoadReport {
            state: LoadState::Clean,
            fragments: 0,
            entries: 0,
            redundant_keys: 0,
        };

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                report.state = LoadState::Missing;
                return report;
            }
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "cache read failed");
                report.state = LoadState::Unreadable;
                return report;
            }
        };

        let stream = serde_json::Deserializer::from_slice(&bytes).into_iter::<Fragment>();
        for fragment in stream {
            match fragment {
                Ok(fragment) => {
                    report.fragments += 1;
                    for (url, result) in fragment {
                        if self.entries.insert(url, result).is_some() {
                            report.redundant_keys += 1;
                        }
                    }
                }
                Err(e) => {
                    report.state = if e.is_eof() {
                        LoadState::TruncatedTail
                    } else {
                        LoadState::Corrupt
                    };
                    tracing::debug!(path = %self.path.display(), error = %e, "cache replay stopped");
                    break;
                }
            }
        }
        report.entries = self.entries.len();
        report
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&RepositoryResult> {
        self.entries.get(url)
    }

    /// Entries not yet written to disk.
    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Fold one unit's outcome in. `None` (a failed unit) never touches an
    /// existing entry.
    pub fn merge_one(&mut self, result: Option<RepositoryResult>, stats: &mut MergeStats) {
        let Some(result) = result else {
            stats.skipped += 1;
            return;
        };
        let url = result.url().to_string();
        if self.entries.insert(url.clone(), result).is_some() {
            stats.replaced += 1;
        } else {
            stats.inserted += 1;
        }
        if self.dirty_set.insert(url.clone()) {
            self.dirty.push(url);
        }
    }

    /// Fold a batch in; results may arrive in any order.
    pub fn merge<I>(&mut self, results: I) -> MergeStats
    where
        I: IntoIterator<Item = Option<RepositoryResult>>,
    {
        let mut stats = MergeStats::default();
        for result in results {
            self.merge_one(result, &mut stats);
        }
        stats
    }

    /// Append every pending entry as fragments of at most `flush_size` keys.
    /// Returns the number of fragments written.
    ///
    /// After a failed append the file is rewritten whole instead, so a
    /// partial line never sits in front of later fragments.
    pub fn flush(&mut self) -> Result<usize, StorageError> {
        if self.dirty.is_empty() {
            return Ok(0);
        }
        if self.torn {
            self.compact()?;
            self.torn = false;
            return Ok(self.entries.len().div_ceil(self.flush_size));
        }
        ensure_parent(&self.path).map_err(|e| self.write_error(e))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0;
        while !self.dirty.is_empty() {
            let take = self.dirty.len().min(self.flush_size);
            // Urls stay pending until their fragment has reached the file.
            let fragment: BTreeMap<&str, &RepositoryResult> = self.dirty[..take]
                .iter()
                .filter_map(|url| self.entries.get(url).map(|r| (url.as_str(), r)))
                .collect();
            let outcome = write_fragment(&mut writer, &fragment).and_then(|()| writer.flush());
            if let Err(e) = outcome {
                let err = self.write_error(e);
                self.torn = true;
                return Err(err);
            }
            for url in self.dirty.drain(..take) {
                self.dirty_set.remove(&url);
            }
            written += 1;
        }
        writer
            .get_ref()
            .sync_data()
            .map_err(|e| self.write_error(e))?;
        tracing::debug!(path = %self.path.display(), fragments = written, "cache flushed");
        Ok(written)
    }

    /// Rewrite the whole cache atomically: temp file in the same directory,
    /// then rename over the old file.
    pub fn compact(&mut self) -> Result<(), StorageError> {
        let dir = ensure_parent(&self.path).map_err(|e| self.write_error(e))?;
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        let mut writer = BufWriter::new(tmp);

        let mut urls: Vec<&String> = self.entries.keys().collect();
        urls.sort();
        for chunk in urls.chunks(self.flush_size) {
            let fragment: BTreeMap<&str, &RepositoryResult> = chunk
                .iter()
                .map(|url| (url.as_str(), &self.entries[*url]))
                .collect();
            write_fragment(&mut writer, &fragment).map_err(|e| self.write_error(e))?;
        }

        let tmp = writer
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        tmp.as_file().sync_data().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        self.dirty.clear();
        self.dirty_set.clear();
        tracing::info!(path = %self.path.display(), entries = self.entries.len(), "cache compacted");
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> StorageError {
        StorageError::CacheWrite {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

fn write_fragment<W: Write>(writer: &mut W, fragment: &BTreeMap<&str, &RepositoryResult>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, fragment)?;
    writer.write_all(b"\n")
}

/// Keep a copy of a corrupt cache next to it before compaction replaces it.
fn preserve_corrupt(path: &Path) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupt");
    match fs::copy(path, &backup) {
        Ok(_) => tracing::info!(backup = %Path::new(&backup).display(), "corrupt cache preserved"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not preserve corrupt cache"),
    }
}

/// Create the parent directory if needed and return it.
fn ensure_parent(path: &Path) -> std::io::Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    Ok(parent)
}
