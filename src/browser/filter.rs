use serde::{Deserialize, Serialize};

use crate::files::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Name,
    /// Newest first.
    Modified,
    /// Largest first.
    Size,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Name => SortMode::Modified,
            SortMode::Modified => SortMode::Size,
            SortMode::Size => SortMode::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Name => "A→Z",
            SortMode::Modified => "↓ date",
            SortMode::Size => "↓ size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionFilter {
    #[default]
    All,
    Markdown,
}

/// Everything that decides which snapshot entries are displayed, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filters {
    pub show_hidden: bool,
    pub extension: ExtensionFilter,
    pub sort: SortMode,
}

impl Filters {
    pub fn admits(&self, entry: &Entry) -> bool {
        if !self.show_hidden && entry.is_hidden() {
            return false;
        }
        // Directories pass the extension filter so navigation keeps working.
        if self.extension == ExtensionFilter::Markdown && !entry.is_dir && !entry.is_note() {
            return false;
        }
        true
    }

    /// Derive the displayed list from a name-ordered snapshot.
    pub fn apply(&self, snapshot: &[Entry]) -> Vec<Entry> {
        let mut displayed: Vec<Entry> = snapshot
            .iter()
            .filter(|e| self.admits(e))
            .cloned()
            .collect();
        sort_entries(&mut displayed, self.sort);
        displayed
    }

    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
    }

    pub fn toggle_markdown_only(&mut self) {
        self.extension = match self.extension {
            ExtensionFilter::All => ExtensionFilter::Markdown,
            ExtensionFilter::Markdown => ExtensionFilter::All,
        };
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
    }

    /// Short labels for the active non-default settings.
    pub fn badges(&self) -> Vec<String> {
        let mut badges = Vec::new();
        if self.extension == ExtensionFilter::Markdown {
            badges.push("[.md only]".to_string());
        }
        if self.show_hidden {
            badges.push("[hidden]".to_string());
        }
        if self.sort != SortMode::Name {
            badges.push(format!("[{}]", self.sort.label()));
        }
        badges
    }
}

/// Stable sort: entries with equal keys keep their incoming order.
pub fn sort_entries(entries: &mut [Entry], mode: SortMode) {
    match mode {
        SortMode::Name => {}
        SortMode::Modified => entries.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortMode::Size => entries.sort_by(|a, b| b.size.cmp(&a.size)),
    }
}
