use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::files::Entry;
use crate::links::WikiLink;
use crate::search::SearchMatch;

const DAY: i64 = 24 * 60 * 60;
const DESCRIPTION_WIDTH: usize = 80;

/// Anything the list pane or a picker can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    File(Entry),
    Link(WikiLink),
    SearchMatch(SearchMatch),
}

impl ListItem {
    pub fn title(&self) -> String {
        match self {
            ListItem::File(entry) if entry.is_error => entry.name.clone(),
            ListItem::File(entry) if entry.is_dir => format!("📁 {}/", entry.name),
            ListItem::File(entry) if entry.is_note() => format!("📝 {}", entry.name),
            ListItem::File(entry) => format!("📄 {}", entry.name),
            ListItem::Link(link) if link.is_resolved() => format!("🔗 {}", link.token),
            ListItem::Link(link) => format!("❓ {} (missing)", link.token),
            ListItem::SearchMatch(m) => format!("📝 {}:{}", file_name(&m.path), m.line_number),
        }
    }

    pub fn description(&self) -> String {
        self.description_at(unix_now())
    }

    pub fn description_at(&self, now: i64) -> String {
        match self {
            ListItem::File(entry) if entry.is_error => String::new(),
            ListItem::File(entry) if entry.is_dir => "Directory".to_string(),
            ListItem::File(entry) => format!(
                "{} • {}",
                format_size(entry.size),
                format_age(entry.modified, now)
            ),
            ListItem::Link(WikiLink {
                path: Some(path), ..
            }) => path.display().to_string(),
            ListItem::Link(_) => "Press Enter to create this note".to_string(),
            ListItem::SearchMatch(m) => truncate(&m.line, DESCRIPTION_WIDTH),
        }
    }

    /// Text typed-ahead lookups match against.
    pub fn filter_key(&self) -> &str {
        match self {
            ListItem::File(entry) => &entry.name,
            ListItem::Link(link) => &link.token,
            ListItem::SearchMatch(m) => m.line.trim_start(),
        }
    }

    /// The file this item stands for, if it points at one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ListItem::File(entry) if !entry.is_error => Some(&entry.path),
            ListItem::File(_) => None,
            ListItem::Link(link) => link.path.as_deref(),
            ListItem::SearchMatch(m) => Some(&m.path),
        }
    }

    pub fn entry(&self) -> Option<&Entry> {
        match self {
            ListItem::File(entry) if !entry.is_error => Some(entry),
            _ => None,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Cut `text` to at most `width` terminal columns, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut head = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        head.push(c);
    }
    format!("{}...", head)
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Coarse age of a timestamp relative to `now`, both in unix seconds.
pub fn format_age(modified: i64, now: i64) -> String {
    let diff = now.saturating_sub(modified);
    if diff < DAY {
        "Today".to_string()
    } else if diff < 7 * DAY {
        format!("{} day(s) ago", diff / DAY)
    } else if diff < 30 * DAY {
        format!("{} week(s) ago", diff / (7 * DAY))
    } else if diff < 365 * DAY {
        format!("{} month(s) ago", diff / (30 * DAY))
    } else {
        format!("over {} year(s) ago", diff / (365 * DAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(name: &str, is_dir: bool) -> Entry {
        Entry {
            name: name.to_string(),
            path: PathBuf::from("/notes").join(name),
            is_dir,
            size: 2048,
            modified: 0,
            is_error: false,
        }
    }

    #[test]
    fn test_file_titles() {
        assert_eq!(ListItem::File(file("ideas", true)).title(), "📁 ideas/");
        assert_eq!(ListItem::File(file("todo.md", false)).title(), "📝 todo.md");
        assert_eq!(ListItem::File(file("photo.png", false)).title(), "📄 photo.png");
    }

    #[test]
    fn test_file_description() {
        let item = ListItem::File(file("todo.md", false));
        assert_eq!(item.description_at(3 * DAY), "2.0 KB • 3 day(s) ago");
        assert_eq!(ListItem::File(file("ideas", true)).description(), "Directory");
    }

    #[test]
    fn test_link_items() {
        let resolved = ListItem::Link(WikiLink {
            token: "Target".into(),
            path: Some(PathBuf::from("/notes/Target.md")),
        });
        assert_eq!(resolved.title(), "🔗 Target");
        assert_eq!(resolved.description(), "/notes/Target.md");
        assert_eq!(resolved.path(), Some(Path::new("/notes/Target.md")));

        let missing = ListItem::Link(WikiLink {
            token: "Ghost".into(),
            path: None,
        });
        assert_eq!(missing.title(), "❓ Ghost (missing)");
        assert_eq!(missing.path(), None);
        assert_eq!(missing.filter_key(), "Ghost");
    }

    #[test]
    fn test_search_match_item() {
        let item = ListItem::SearchMatch(SearchMatch {
            path: PathBuf::from("/notes/a.md"),
            line_number: 12,
            line: "x".repeat(100),
        });
        assert_eq!(item.title(), "📝 a.md:12");
        assert_eq!(item.description().chars().count(), DESCRIPTION_WIDTH + 3);
    }

    #[test]
    fn test_truncate_counts_columns() {
        assert_eq!(truncate("短い", 4), "短い");
        assert_eq!(truncate("日本語のメモ", 5), "日本...");
    }

    #[test]
    fn test_error_entry_has_no_path() {
        let err = Entry::error(Path::new("/locked"), &std::io::Error::other("denied"));
        let item = ListItem::File(err);
        assert!(item.path().is_none());
        assert!(item.entry().is_none());
        assert_eq!(item.title(), "[Error: denied]");
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_age(100, 200), "Today");
        assert_eq!(format_age(0, 14 * DAY), "2 week(s) ago");
        assert_eq!(format_age(0, 400 * DAY), "over 1 year(s) ago");
    }
}
