//! Directory snapshots: the immediate, non-recursive listing of one directory.

mod ops;

pub use ops::{
    create_dir, create_link_note, create_note, delete, paste, rename, validate_name, ClipMode,
    FileClipboard,
};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::warn;

/// Extension of the files treated as notes.
pub const NOTE_EXTENSION: &str = "md";

/// One file or directory as seen when its parent was last read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    /// Unix seconds.
    pub modified: i64,
    /// Set on the placeholder entry produced for an unreadable directory.
    pub is_error: bool,
}

impl Entry {
    pub fn from_metadata(path: PathBuf, metadata: &fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self {
            name,
            path,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified,
            is_error: false,
        }
    }

    /// Placeholder shown instead of the listing of a directory that could not be read.
    pub fn error(dir: &Path, err: &io::Error) -> Self {
        Self {
            name: format!("[Error: {}]", err),
            path: dir.to_path_buf(),
            is_dir: false,
            size: 0,
            modified: 0,
            is_error: true,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    pub fn is_note(&self) -> bool {
        !self.is_dir && has_note_extension(&self.path)
    }
}

pub fn has_note_extension(path: &Path) -> bool {
    path.extension().map(|e| e == NOTE_EXTENSION).unwrap_or(false)
}

/// Read the entries directly inside `dir`, sorted by name.
///
/// Never fails: an unreadable directory produces a single error entry so
/// the browser always has something to show.
pub fn read_snapshot(dir: &Path) -> Vec<Entry> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return vec![Entry::error(dir, &e)];
        }
    };

    let mut entries: Vec<Entry> = read
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(Entry::from_metadata(entry.path(), &metadata))
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
