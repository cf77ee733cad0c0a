use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::fuzzy::fuzzy_match;
use crate::files::Entry;

/// Flat listing of every file and directory below a root, used as the
/// corpus for name search.
///
/// Built once and never updated: changes on disk stay invisible until the
/// index is dropped and rebuilt.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    /// Root this index was built for
    pub root: PathBuf,
    /// Every entry below `root`, in walk order (depth-first, by file name)
    pub entries: Vec<Entry>,
}

impl TreeIndex {
    /// Walk `root` recursively. Unreadable entries are skipped.
    pub fn build(root: &Path) -> Self {
        let entries: Vec<Entry> = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!(error = %e, "skipping unreadable entry");
                        return None;
                    }
                };
                let metadata = entry.metadata().ok()?;
                Some(Entry::from_metadata(entry.into_path(), &metadata))
            })
            .collect();

        info!(root = %root.display(), entries = entries.len(), "built tree index");
        Self {
            root: root.to_path_buf(),
            entries,
        }
    }

    /// Path of `entry` relative to the root, the string name search runs against.
    pub fn relative_path(&self, entry: &Entry) -> String {
        entry
            .path
            .strip_prefix(&self.root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| entry.name.clone())
    }

    /// Rank the index against `query`. An empty query returns the whole
    /// index in walk order; otherwise non-matches are dropped and the rest
    /// are ordered by descending score (ties keep walk order).
    pub fn search(&self, query: &str) -> Vec<Entry> {
        if query.is_empty() {
            return self.entries.clone();
        }

        let mut scored: Vec<(i32, &Entry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                fuzzy_match(&self.relative_path(entry), query).map(|score| (score, entry))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, entry)| entry.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("journal/2024")).unwrap();
        fs::create_dir_all(dir.path().join("projects")).unwrap();
        fs::write(dir.path().join("journal/2024/jan.md"), "").unwrap();
        fs::write(dir.path().join("projects/rust.md"), "").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        dir
    }

    fn rel(index: &TreeIndex, entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| index.relative_path(e)).collect()
    }

    #[test]
    fn test_build_collects_files_and_directories_but_not_root() {
        let dir = fixture();
        let index = TreeIndex::build(dir.path());

        assert_eq!(
            rel(&index, &index.entries),
            vec![
                "journal",
                "journal/2024",
                "journal/2024/jan.md",
                "projects",
                "projects/rust.md",
                "readme.md",
            ]
        );
        assert!(index.entries.iter().all(|e| e.path != dir.path()));
        assert!(index.entries[0].is_dir);
    }

    #[test]
    fn test_empty_query_returns_full_index_in_order() {
        let dir = fixture();
        let index = TreeIndex::build(dir.path());
        assert_eq!(index.search(""), index.entries);
    }

    #[test]
    fn test_search_ranks_and_drops_non_matches() {
        let dir = fixture();
        let index = TreeIndex::build(dir.path());

        let hits = index.search("rust");
        assert_eq!(rel(&index, &hits), vec!["projects/rust.md"]);

        let hits = index.search("projects/rust.md");
        assert_eq!(rel(&index, &hits)[0], "projects/rust.md");

        assert!(index.search("zzz").is_empty());
    }

    #[test]
    fn test_index_is_a_snapshot() {
        let dir = fixture();
        let index = TreeIndex::build(dir.path());
        fs::write(dir.path().join("late.md"), "").unwrap();
        assert!(index.search("late").is_empty());
        assert!(!TreeIndex::build(dir.path()).search("late").is_empty());
    }
}
