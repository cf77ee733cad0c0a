use std::path::{Path, PathBuf};

const MAX_HISTORY: usize = 100;

/// Browser-style back/forward over visited directories.
///
/// Only paths are kept; re-reading a directory after a move is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    entries: Vec<PathBuf>,
    index: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `path` the current position, dropping anything ahead of it.
    /// Visiting the current directory again is a no-op.
    pub fn visit(&mut self, path: PathBuf) {
        if self.current() == Some(path.as_path()) {
            return;
        }
        if self.index + 1 < self.entries.len() {
            self.entries.truncate(self.index + 1);
        }

        self.entries.push(path);
        self.index = self.entries.len() - 1;

        if self.entries.len() > MAX_HISTORY {
            let remove_count = self.entries.len() - MAX_HISTORY;
            self.entries.drain(0..remove_count);
            self.index = self.index.saturating_sub(remove_count);
        }
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn current(&self) -> Option<&Path> {
        self.entries.get(self.index).map(PathBuf::as_path)
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0 && !self.entries.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_empty_history_cannot_move() {
        let mut history = NavigationHistory::new();
        assert_eq!(history.current(), None);
        assert!(!history.back());
        assert!(!history.forward());
    }

    #[test]
    fn test_back_returns_previous_visit() {
        let mut history = NavigationHistory::new();
        history.visit(p("/d1"));
        history.visit(p("/d2"));
        assert!(history.back());
        assert_eq!(history.current(), Some(Path::new("/d1")));
        assert!(!history.back());
    }

    #[test]
    fn test_back_then_forward_restores_directory() {
        let mut history = NavigationHistory::new();
        for d in ["/a", "/b", "/c"] {
            history.visit(p(d));
        }
        let before = history.current().map(Path::to_path_buf);
        assert!(history.back());
        assert!(history.forward());
        assert_eq!(history.current().map(Path::to_path_buf), before);
    }

    #[test]
    fn test_visit_after_back_discards_forward_tail() {
        let mut history = NavigationHistory::new();
        history.visit(p("/d1"));
        history.visit(p("/d2"));
        history.back();
        history.visit(p("/d3"));

        assert!(!history.forward());
        assert_eq!(history.current(), Some(Path::new("/d3")));
        assert!(history.back());
        assert_eq!(history.current(), Some(Path::new("/d1")));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_revisiting_current_directory_is_idempotent() {
        let mut history = NavigationHistory::new();
        history.visit(p("/d1"));
        history.visit(p("/d1"));
        assert_eq!(history.len(), 1);
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = NavigationHistory::new();
        for i in 0..(MAX_HISTORY + 25) {
            history.visit(p(&format!("/d{}", i)));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(
            history.current(),
            Some(Path::new(&format!("/d{}", MAX_HISTORY + 24)))
        );
        assert!(!history.can_go_forward());
    }
}
