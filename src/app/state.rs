use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use super::effects::Effect;
use super::input::TextInput;
use super::items::ListItem;
use crate::browser::{Filters, NavigationHistory};
use crate::files::{Entry, FileClipboard};
use crate::search::TreeIndex;

pub const STATUS_DURATION: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RECENT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Browsing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub until: Instant,
}

/// A selectable list inside a modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picker {
    pub items: Vec<ListItem>,
    pub selected: usize,
}

impl Picker {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self { items, selected: 0 }
    }

    pub fn selected_item(&self) -> Option<&ListItem> {
        self.items.get(self.selected)
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.items.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    /// Select the next item, after the current one and wrapping around, whose
    /// filter key starts with `c`. Case is ignored.
    pub fn jump_to(&mut self, c: char) -> bool {
        let count = self.items.len();
        let found = (1..=count)
            .map(|step| (self.selected + step) % count)
            .find(|&idx| {
                self.items[idx]
                    .filter_key()
                    .chars()
                    .next()
                    .is_some_and(|first| first.to_lowercase().eq(c.to_lowercase()))
            });
        if let Some(idx) = found {
            self.selected = idx;
        }
        found.is_some()
    }

    pub fn set_items(&mut self, items: Vec<ListItem>) {
        self.items = items;
        self.selected = 0;
    }

    pub fn remove_selected(&mut self) -> Option<ListItem> {
        if self.selected >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(self.selected);
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        Some(removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteField {
    #[default]
    Name,
    Body,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteForm {
    pub name: TextInput,
    pub body: TextInput,
    pub focus: NoteField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSearch {
    pub input: TextInput,
    pub results: Picker,
    /// The tree index is still being built
    pub indexing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSearch {
    pub input: TextInput,
    pub results: Picker,
    pub searching: bool,
    /// Query of the last search started from this modal
    pub last_query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Recent,
    Bookmarks,
}

/// The overlay currently owning the keyboard. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    CreateNote(NoteForm),
    ConfirmDelete { path: PathBuf, name: String },
    Rename {
        path: PathBuf,
        original: String,
        input: TextInput,
    },
    CreateDir { input: TextInput },
    RecentFiles(Picker),
    Bookmarks(Picker),
    Help,
    Links(Picker),
    ListSearch(ListSearch),
    NoteSearch { input: TextInput },
    ContentSearch(ContentSearch),
}

impl Modal {
    pub fn label(&self) -> &'static str {
        match self {
            Modal::CreateNote(_) => "New note",
            Modal::ConfirmDelete { .. } => "Delete",
            Modal::Rename { .. } => "Rename",
            Modal::CreateDir { .. } => "New directory",
            Modal::RecentFiles(_) => "Recent",
            Modal::Bookmarks(_) => "Bookmarks",
            Modal::Help => "Help",
            Modal::Links(_) => "Links",
            Modal::ListSearch(_) => "Search",
            Modal::NoteSearch { .. } => "Search in note",
            Modal::ContentSearch(_) => "Content search",
        }
    }
}

/// A note as read from disk: its raw text and the text shown with wiki links rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteContent {
    pub raw: String,
    pub rendered: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub path: Option<PathBuf>,
    pub content: Option<NoteContent>,
    pub error: Option<String>,
    pub scroll: u16,
}

impl Preview {
    fn loading(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.raw.as_str())
    }
}

/// What the session starts from.
#[derive(Debug, Clone)]
pub struct SessionInit {
    pub root: PathBuf,
    pub home: Option<PathBuf>,
    pub filters: Filters,
    pub theme_index: usize,
    pub theme_count: usize,
    pub bookmarks: Vec<PathBuf>,
    pub recent_files: Vec<PathBuf>,
    pub max_recent: usize,
}

impl SessionInit {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            home: None,
            filters: Filters::default(),
            theme_index: 0,
            theme_count: 1,
            bookmarks: Vec::new(),
            recent_files: Vec::new(),
            max_recent: DEFAULT_MAX_RECENT,
        }
    }
}

pub struct Session {
    pub screen: Screen,
    pub root: PathBuf,
    pub home: Option<PathBuf>,
    pub current_dir: PathBuf,
    pub history: NavigationHistory,
    pub filters: Filters,
    /// Name-ordered listing of `current_dir`
    pub snapshot: Vec<Entry>,
    /// `snapshot` after filtering and sorting
    pub items: Vec<ListItem>,
    pub selected: usize,
    pub index: Option<TreeIndex>,
    pub modal: Option<Modal>,
    pub preview: Preview,
    pub theme_index: usize,
    pub theme_count: usize,
    pub bookmarks: Vec<PathBuf>,
    pub recent_files: Vec<PathBuf>,
    pub max_recent: usize,
    pub clipboard: Option<FileClipboard>,
    pub status: Option<StatusMessage>,
    /// Rows available to the list, for half-page moves
    pub page_size: usize,
    /// Generation of the latest content search started
    pub content_generation: u64,
    pub should_quit: bool,
    pub(super) pending_select: Option<PathBuf>,
    pub(super) pending_scroll: Option<u16>,
    pub(super) pending_g: bool,
}

impl Session {
    pub fn new(init: SessionInit) -> Self {
        let theme_count = init.theme_count.max(1);
        Self {
            screen: Screen::Home,
            current_dir: init.root.clone(),
            root: init.root,
            home: init.home,
            history: NavigationHistory::new(),
            filters: init.filters,
            snapshot: Vec::new(),
            items: Vec::new(),
            selected: 0,
            index: None,
            modal: None,
            preview: Preview::default(),
            theme_index: init.theme_index % theme_count,
            theme_count,
            bookmarks: init.bookmarks,
            recent_files: init.recent_files,
            max_recent: init.max_recent.max(1),
            clipboard: None,
            status: None,
            page_size: 20,
            content_generation: 0,
            should_quit: false,
            pending_select: None,
            pending_scroll: None,
            pending_g: false,
        }
    }

    pub fn selected_item(&self) -> Option<&ListItem> {
        self.items.get(self.selected)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.selected_item().and_then(ListItem::entry)
    }

    /// Make `dir` the current directory: record it in history and re-read it.
    pub fn visit(&mut self, dir: PathBuf) -> Vec<Effect> {
        debug!(dir = %dir.display(), "visit");
        self.history.visit(dir.clone());
        self.show_dir(dir)
    }

    /// Visit the directory holding `file` and select it once listed.
    pub fn reveal(&mut self, file: &Path) -> Vec<Effect> {
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        let effects = self.visit(dir);
        self.pending_select = Some(file.to_path_buf());
        effects
    }

    pub fn back(&mut self) -> Vec<Effect> {
        if !self.history.back() {
            return Vec::new();
        }
        match self.history.current() {
            Some(dir) => {
                let dir = dir.to_path_buf();
                self.show_dir(dir)
            }
            None => Vec::new(),
        }
    }

    pub fn forward(&mut self) -> Vec<Effect> {
        if !self.history.forward() {
            return Vec::new();
        }
        match self.history.current() {
            Some(dir) => {
                let dir = dir.to_path_buf();
                self.show_dir(dir)
            }
            None => Vec::new(),
        }
    }

    fn show_dir(&mut self, dir: PathBuf) -> Vec<Effect> {
        self.current_dir = dir.clone();
        self.snapshot.clear();
        self.items.clear();
        self.selected = 0;
        self.preview = Preview::default();
        self.pending_select = None;
        self.pending_scroll = None;
        vec![Effect::ReadDir { dir }]
    }

    /// Re-read the current directory, keeping the selection where possible.
    pub fn reload(&mut self) -> Effect {
        Effect::ReadDir {
            dir: self.current_dir.clone(),
        }
    }

    pub fn apply_snapshot(&mut self, dir: &Path, entries: Vec<Entry>) -> Vec<Effect> {
        if dir != self.current_dir {
            debug!(dir = %dir.display(), "dropping listing of a directory no longer shown");
            return Vec::new();
        }
        self.snapshot = entries;
        let keep = self
            .pending_select
            .take()
            .or_else(|| self.selected_entry().map(|e| e.path.clone()));
        self.rebuild_items(keep)
    }

    /// Recompute the displayed list after a filter or sort change.
    pub fn apply_filters(&mut self) -> Vec<Effect> {
        let keep = self.selected_entry().map(|e| e.path.clone());
        self.rebuild_items(keep)
    }

    fn rebuild_items(&mut self, keep: Option<PathBuf>) -> Vec<Effect> {
        self.items = self
            .filters
            .apply(&self.snapshot)
            .into_iter()
            .map(ListItem::File)
            .collect();

        let found = keep.and_then(|path| {
            self.items
                .iter()
                .position(|item| item.path() == Some(path.as_path()))
        });
        self.selected = found.unwrap_or_else(|| self.selected.min(self.items.len().saturating_sub(1)));
        self.preview_selected()
    }

    pub fn select(&mut self, index: usize) -> Vec<Effect> {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self.preview_selected()
    }

    pub fn move_selection(&mut self, delta: isize) -> Vec<Effect> {
        let target = (self.selected as isize + delta).max(0) as usize;
        self.select(target)
    }

    /// Load the selected file into the preview unless it is already there.
    pub fn preview_selected(&mut self) -> Vec<Effect> {
        let path = match self.selected_entry() {
            Some(entry) if !entry.is_dir => entry.path.clone(),
            _ => return Vec::new(),
        };
        if self.preview.path.as_deref() == Some(path.as_path()) {
            return Vec::new();
        }
        self.preview = Preview::loading(path.clone());
        vec![Effect::LoadNote {
            path,
            root: self.root.clone(),
        }]
    }

    pub fn apply_note(&mut self, path: &Path, content: Result<NoteContent, String>) {
        if self.preview.path.as_deref() != Some(path) {
            debug!(path = %path.display(), "dropping preview of a note no longer selected");
            return;
        }
        match content {
            Ok(content) => {
                self.preview.content = Some(content);
                self.preview.error = None;
                self.preview.scroll = self.pending_scroll.take().unwrap_or(0);
            }
            Err(e) => {
                self.preview.content = None;
                self.preview.error = Some(e);
                self.preview.scroll = 0;
            }
        }
    }

    pub fn scroll_preview(&mut self, delta: i32) {
        let max = self
            .preview
            .raw()
            .map(|raw| raw.lines().count().saturating_sub(1))
            .unwrap_or(0) as i32;
        let next = (self.preview.scroll as i32 + delta).clamp(0, max.max(0));
        self.preview.scroll = next as u16;
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            until: Instant::now() + STATUS_DURATION,
        });
    }

    /// Drop the status message once its time is up. Returns whether it changed.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        match &self.status {
            Some(status) if status.until <= now => {
                self.status = None;
                true
            }
            _ => false,
        }
    }

    pub fn cycle_theme(&mut self) {
        self.theme_index = (self.theme_index + 1) % self.theme_count;
    }

    pub fn is_bookmarked(&self, path: &Path) -> bool {
        self.bookmarks.iter().any(|b| b == path)
    }

    /// Add or remove `path` from the bookmarks. Returns `true` when added.
    pub fn toggle_bookmark(&mut self, path: &Path) -> bool {
        if let Some(pos) = self.bookmarks.iter().position(|b| b == path) {
            self.bookmarks.remove(pos);
            return false;
        }
        self.bookmarks.push(path.to_path_buf());
        true
    }

    /// Move `path` to the front of the recent files, dropping the oldest past the limit.
    pub fn track_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files.truncate(self.max_recent);
    }

    /// Forget a path that no longer exists.
    pub fn forget_path(&mut self, path: &Path) {
        self.bookmarks.retain(|p| !p.starts_with(path));
        self.recent_files.retain(|p| !p.starts_with(path));
        if self
            .preview
            .path
            .as_deref()
            .map(|p| p.starts_with(path))
            .unwrap_or(false)
        {
            self.preview = Preview::default();
        }
    }

    /// Point saved references at a renamed path.
    pub fn rename_path(&mut self, from: &Path, to: &Path) {
        for p in self.bookmarks.iter_mut().chain(self.recent_files.iter_mut()) {
            let Ok(rest) = p.strip_prefix(from) else { continue };
            *p = if rest.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(rest)
            };
        }
    }

    /// File and directory counts of the unfiltered snapshot.
    pub fn counts(&self) -> (usize, usize) {
        let dirs = self.snapshot.iter().filter(|e| e.is_dir).count();
        let files = self.snapshot.iter().filter(|e| !e.is_dir && !e.is_error).count();
        (files, dirs)
    }

    pub fn mode_label(&self) -> &'static str {
        match (&self.modal, self.screen) {
            (Some(modal), _) => modal.label(),
            (None, Screen::Home) => "Home",
            (None, Screen::Browsing) => "Browser",
        }
    }

    pub fn note_search_query(&self) -> Option<&str> {
        match &self.modal {
            Some(Modal::NoteSearch { input }) => Some(input.value()),
            _ => None,
        }
    }
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Wrap every case-insensitive occurrence of `query` in `content` with match markers.
pub fn highlight_matches(content: &str, query: &str) -> String {
    let query: Vec<char> = query.chars().collect();
    if query.is_empty() {
        return content.to_string();
    }

    let chars: Vec<(usize, char)> = content.char_indices().collect();
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    let mut i = 0;
    while i + query.len() <= chars.len() {
        let hit = query
            .iter()
            .zip(&chars[i..])
            .all(|(q, (_, c))| chars_match(*c, *q));
        if !hit {
            i += 1;
            continue;
        }
        let start = chars[i].0;
        let end = chars
            .get(i + query.len())
            .map(|(idx, _)| *idx)
            .unwrap_or(content.len());
        out.push_str(&content[last..start]);
        out.push_str("**⚡ ");
        out.push_str(&content[start..end]);
        out.push_str(" ⚡**");
        last = end;
        i += query.len();
    }
    out.push_str(&content[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dir: &str, name: &str, is_dir: bool) -> Entry {
        Entry {
            name: name.to_string(),
            path: PathBuf::from(dir).join(name),
            is_dir,
            size: 1,
            modified: 1,
            is_error: false,
        }
    }

    fn session() -> Session {
        Session::new(SessionInit::new(PathBuf::from("/notes")))
    }

    #[test]
    fn test_visit_resets_view_and_reads_dir() {
        let mut s = session();
        s.preview.path = Some(PathBuf::from("/notes/a.md"));
        s.selected = 3;

        let effects = s.visit(PathBuf::from("/notes/sub"));
        assert_eq!(
            effects,
            vec![Effect::ReadDir {
                dir: PathBuf::from("/notes/sub")
            }]
        );
        assert_eq!(s.current_dir, PathBuf::from("/notes/sub"));
        assert_eq!(s.preview, Preview::default());
        assert_eq!(s.selected, 0);
        assert_eq!(s.history.current(), Some(Path::new("/notes/sub")));
    }

    #[test]
    fn test_stale_listing_is_ignored() {
        let mut s = session();
        s.visit(PathBuf::from("/notes/b"));
        let effects = s.apply_snapshot(Path::new("/notes/a"), vec![entry("/notes/a", "x.md", false)]);
        assert!(effects.is_empty());
        assert!(s.items.is_empty());
    }

    #[test]
    fn test_snapshot_selects_pending_and_previews() {
        let mut s = session();
        s.reveal(Path::new("/notes/sub/b.md"));
        let effects = s.apply_snapshot(
            Path::new("/notes/sub"),
            vec![
                entry("/notes/sub", "a.md", false),
                entry("/notes/sub", "b.md", false),
            ],
        );
        assert_eq!(s.selected, 1);
        assert_eq!(
            effects,
            vec![Effect::LoadNote {
                path: PathBuf::from("/notes/sub/b.md"),
                root: PathBuf::from("/notes"),
            }]
        );
    }

    #[test]
    fn test_filter_change_keeps_selection() {
        let mut s = session();
        s.visit(PathBuf::from("/notes"));
        s.apply_snapshot(
            Path::new("/notes"),
            vec![
                entry("/notes", ".hidden.md", false),
                entry("/notes", "a.md", false),
                entry("/notes", "b.md", false),
            ],
        );
        s.select(1);
        assert_eq!(s.selected_entry().map(|e| e.name.as_str()), Some("b.md"));

        s.filters.toggle_hidden();
        s.apply_filters();
        assert_eq!(s.items.len(), 3);
        assert_eq!(s.selected_entry().map(|e| e.name.as_str()), Some("b.md"));
    }

    #[test]
    fn test_selecting_a_directory_keeps_preview() {
        let mut s = session();
        s.visit(PathBuf::from("/notes"));
        s.apply_snapshot(
            Path::new("/notes"),
            vec![entry("/notes", "a.md", false), entry("/notes", "dir", true)],
        );
        assert_eq!(s.preview.path, Some(PathBuf::from("/notes/a.md")));
        assert!(s.select(1).is_empty());
        assert_eq!(s.preview.path, Some(PathBuf::from("/notes/a.md")));
    }

    #[test]
    fn test_late_note_is_dropped() {
        let mut s = session();
        s.preview.path = Some(PathBuf::from("/notes/new.md"));
        s.apply_note(
            Path::new("/notes/old.md"),
            Ok(NoteContent {
                raw: "old".into(),
                rendered: "old".into(),
            }),
        );
        assert!(s.preview.content.is_none());
    }

    #[test]
    fn test_recent_files_are_bounded_and_deduplicated() {
        let mut s = Session::new(SessionInit {
            max_recent: 3,
            ..SessionInit::new(PathBuf::from("/notes"))
        });
        for name in ["a", "b", "c", "a", "d"] {
            s.track_recent(&PathBuf::from(format!("/notes/{}.md", name)));
        }
        let names: Vec<String> = s
            .recent_files
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(names, vec!["/notes/d.md", "/notes/a.md", "/notes/c.md"]);
    }

    #[test]
    fn test_bookmark_toggle_and_rename() {
        let mut s = session();
        let path = PathBuf::from("/notes/dir/a.md");
        assert!(s.toggle_bookmark(&path));
        assert!(s.is_bookmarked(&path));

        s.rename_path(Path::new("/notes/dir"), Path::new("/notes/renamed"));
        assert!(s.is_bookmarked(Path::new("/notes/renamed/a.md")));

        s.forget_path(Path::new("/notes/renamed"));
        assert!(s.bookmarks.is_empty());
    }

    #[test]
    fn test_status_expires() {
        let mut s = session();
        s.set_status("Saved");
        assert!(!s.expire_status(Instant::now()));
        assert!(s.expire_status(Instant::now() + STATUS_DURATION));
        assert!(s.status.is_none());
    }

    #[test]
    fn test_picker_bounds() {
        let file = |n: &str| ListItem::File(entry("/notes", n, false));
        let mut picker = Picker::new(vec![file("a"), file("b")]);
        picker.move_by(5);
        assert_eq!(picker.selected, 1);
        picker.move_by(-9);
        assert_eq!(picker.selected, 0);
        picker.move_by(1);
        picker.remove_selected();
        assert_eq!(picker.selected, 0);
        picker.remove_selected();
        assert!(picker.remove_selected().is_none());
    }

    #[test]
    fn test_picker_jump_wraps_by_first_letter() {
        let file = |n: &str| ListItem::File(entry("/notes", n, false));
        let mut picker = Picker::new(vec![file("Alpha.md"), file("beta.md"), file("apple.md")]);
        assert!(picker.jump_to('a'));
        assert_eq!(picker.selected, 2);
        assert!(picker.jump_to('A'));
        assert_eq!(picker.selected, 0);
        assert!(!picker.jump_to('z'));
        assert_eq!(picker.selected, 0);
        assert!(!Picker::new(Vec::new()).jump_to('a'));
    }

    #[test]
    fn test_highlight_matches() {
        assert_eq!(
            highlight_matches("Rust and rust", "RUST"),
            "**⚡ Rust ⚡** and **⚡ rust ⚡**"
        );
        assert_eq!(highlight_matches("café Café", "café"), "**⚡ café ⚡** **⚡ Café ⚡**");
        assert_eq!(highlight_matches("abc", ""), "abc");
        assert_eq!(highlight_matches("aaa", "aa"), "**⚡ aa ⚡**a");
    }
}
