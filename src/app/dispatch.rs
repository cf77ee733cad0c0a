use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::effects::{Effect, FileOp, FileOpOutcome};
use super::input::{Key, TextInput};
use super::items::ListItem;
use super::state::{
    ContentSearch, ListSearch, Modal, NoteContent, NoteField, NoteForm, Picker, PickerKind,
    Screen, Session,
};
use crate::error::FsError;
use crate::files::{validate_name, ClipMode, Entry, FileClipboard};
use crate::links::{self, WikiLink};
use crate::search::{ContentSearchDone, TreeIndex};

const PREVIEW_SCROLL_STEP: i32 = 3;

/// Everything the session reacts to: key presses and the outcome of effects.
#[derive(Debug)]
pub enum Event {
    Key(Key),
    /// Rows available to the file list
    Resize { height: u16 },
    DirLoaded { dir: PathBuf, entries: Vec<Entry> },
    NoteLoaded {
        path: PathBuf,
        content: Result<NoteContent, String>,
    },
    IndexBuilt(TreeIndex),
    LinksResolved(Vec<WikiLink>),
    PickerLoaded { kind: PickerKind, entries: Vec<Entry> },
    FileOpFinished(Result<FileOpOutcome, String>),
    EditorFinished {
        path: PathBuf,
        result: Result<(), String>,
    },
    Notice(String),
    ContentSearchFinished(ContentSearchDone),
}

/// Apply one event to the session and return the effects it asks for.
pub fn dispatch(session: &mut Session, event: Event) -> Vec<Effect> {
    match event {
        Event::Key(key) => handle_key(session, key),
        Event::Resize { height } => {
            session.page_size = (height as usize).max(1);
            Vec::new()
        }
        Event::DirLoaded { dir, entries } => session.apply_snapshot(&dir, entries),
        Event::NoteLoaded { path, content } => {
            session.apply_note(&path, content);
            Vec::new()
        }
        Event::IndexBuilt(index) => {
            on_index_built(session, index);
            Vec::new()
        }
        Event::LinksResolved(resolved) => {
            if session.modal.is_none() {
                let items = resolved.into_iter().map(ListItem::Link).collect();
                session.modal = Some(Modal::Links(Picker::new(items)));
            }
            Vec::new()
        }
        Event::PickerLoaded { kind, entries } => {
            if session.modal.is_none() {
                let picker = Picker::new(entries.into_iter().map(ListItem::File).collect());
                session.modal = Some(match kind {
                    PickerKind::Recent => Modal::RecentFiles(picker),
                    PickerKind::Bookmarks => Modal::Bookmarks(picker),
                });
            }
            Vec::new()
        }
        Event::FileOpFinished(result) => on_file_op(session, result),
        Event::EditorFinished { path, result } => on_editor_finished(session, path, result),
        Event::Notice(message) => {
            session.set_status(message);
            Vec::new()
        }
        Event::ContentSearchFinished(done) => {
            on_content_search_finished(session, done);
            Vec::new()
        }
    }
}

fn handle_key(session: &mut Session, key: Key) -> Vec<Effect> {
    if session.modal.is_some() {
        return handle_modal_key(session, key);
    }
    match session.screen {
        Screen::Home => handle_home_key(session, key),
        Screen::Browsing => handle_browser_key(session, key),
    }
}

fn handle_home_key(session: &mut Session, key: Key) -> Vec<Effect> {
    match key {
        Key::Enter => {
            session.screen = Screen::Browsing;
            let root = session.root.clone();
            session.visit(root)
        }
        Key::Char('t') => {
            session.cycle_theme();
            Vec::new()
        }
        Key::Char('?') => {
            session.modal = Some(Modal::Help);
            Vec::new()
        }
        Key::Char('q') | Key::Ctrl('c') => {
            session.should_quit = true;
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn parent_of(dir: &Path) -> Option<PathBuf> {
    dir.parent()
        .filter(|parent| *parent != dir)
        .map(Path::to_path_buf)
}

fn handle_browser_key(session: &mut Session, key: Key) -> Vec<Effect> {
    let pending_g = std::mem::take(&mut session.pending_g);

    match key {
        Key::Char('q') | Key::Ctrl('c') => {
            session.should_quit = true;
            Vec::new()
        }

        Key::Char('j') | Key::Down => session.move_selection(1),
        Key::Char('k') | Key::Up => session.move_selection(-1),
        Key::Char('g') if pending_g => session.select(0),
        Key::Char('g') => {
            session.pending_g = true;
            Vec::new()
        }
        Key::Char('G') | Key::End => {
            let last = session.items.len().saturating_sub(1);
            session.select(last)
        }
        Key::Home => session.select(0),
        Key::Ctrl('d') | Key::PageDown => {
            let half = (session.page_size / 2).max(1) as isize;
            session.move_selection(half)
        }
        Key::Ctrl('u') | Key::PageUp => {
            let half = (session.page_size / 2).max(1) as isize;
            session.move_selection(-half)
        }

        Key::Enter | Key::Char('l') | Key::Right => open_selected(session),
        Key::Char('h') | Key::Left | Key::Char('-') => match parent_of(&session.current_dir) {
            Some(parent) => session.visit(parent),
            None => Vec::new(),
        },
        Key::Char('~') => go_home(session),
        Key::Ctrl('o') => session.back(),
        Key::Tab | Key::Ctrl('i') => session.forward(),

        Key::Char('u') => {
            session.scroll_preview(-PREVIEW_SCROLL_STEP);
            Vec::new()
        }
        Key::Char('d') => {
            session.scroll_preview(PREVIEW_SCROLL_STEP);
            Vec::new()
        }

        Key::Char('D') => {
            if let Some(entry) = session.selected_entry() {
                session.modal = Some(Modal::ConfirmDelete {
                    path: entry.path.clone(),
                    name: entry.name.clone(),
                });
            }
            Vec::new()
        }
        Key::Char('r') => {
            if let Some(entry) = session.selected_entry() {
                session.modal = Some(Modal::Rename {
                    path: entry.path.clone(),
                    original: entry.name.clone(),
                    input: TextInput::with_value(&entry.name),
                });
            }
            Vec::new()
        }
        Key::Char('e') => match session.selected_entry() {
            Some(entry) if !entry.is_dir => vec![Effect::OpenEditor {
                path: entry.path.clone(),
            }],
            _ => Vec::new(),
        },
        Key::Char('n') => {
            session.modal = Some(Modal::CreateNote(NoteForm::default()));
            Vec::new()
        }
        Key::Char('N') => {
            session.modal = Some(Modal::CreateDir {
                input: TextInput::new(),
            });
            Vec::new()
        }

        Key::Char('t') => {
            session.cycle_theme();
            Vec::new()
        }
        Key::Char('?') => {
            session.modal = Some(Modal::Help);
            Vec::new()
        }
        Key::Char('m') => {
            session.filters.toggle_markdown_only();
            session.apply_filters()
        }
        Key::Char('.') => {
            session.filters.toggle_hidden();
            session.apply_filters()
        }
        Key::Char('s') => {
            session.filters.cycle_sort();
            session.apply_filters()
        }

        Key::Char('y') => match session.selected_entry() {
            Some(entry) => vec![Effect::CopyPath {
                path: entry.path.clone(),
            }],
            None => Vec::new(),
        },
        Key::Char('Y') => match session.selected_entry() {
            Some(entry) if !entry.is_dir => vec![Effect::CopyContent {
                path: entry.path.clone(),
            }],
            _ => Vec::new(),
        },
        Key::Char('c') => mark_for_paste(session, ClipMode::Copy),
        Key::Char('x') => mark_for_paste(session, ClipMode::Cut),
        Key::Char('p') => match session.clipboard.clone() {
            Some(clip) => vec![Effect::Paste {
                clip,
                dest: session.current_dir.clone(),
            }],
            None => {
                session.set_status(format!("Error: {}", FsError::EmptyClipboard));
                Vec::new()
            }
        },

        Key::Char('b') => {
            if let Some(path) = session
                .selected_entry()
                .filter(|e| !e.is_dir)
                .map(|e| e.path.clone())
            {
                let added = session.toggle_bookmark(&path);
                session.set_status(if added {
                    "Bookmark added"
                } else {
                    "Bookmark removed"
                });
            }
            Vec::new()
        }
        Key::Char('B') => vec![Effect::LoadPicker {
            kind: PickerKind::Bookmarks,
            paths: session.bookmarks.clone(),
        }],
        Key::Ctrl('r') => vec![Effect::LoadPicker {
            kind: PickerKind::Recent,
            paths: session.recent_files.clone(),
        }],
        Key::Char('L') => show_links(session),

        Key::Char('F') => {
            if session.preview.content.is_some() {
                session.modal = Some(Modal::NoteSearch {
                    input: TextInput::new(),
                });
            }
            Vec::new()
        }
        Key::Char('/') => open_list_search(session),
        Key::Ctrl('f') => {
            session.modal = Some(Modal::ContentSearch(ContentSearch::default()));
            Vec::new()
        }
        Key::Char('R') => {
            info!(root = %session.root.display(), "refresh");
            session.index = None;
            session.set_status("Refreshed");
            vec![
                session.reload(),
                Effect::BuildIndex {
                    root: session.root.clone(),
                },
            ]
        }

        _ => Vec::new(),
    }
}

fn open_selected(session: &mut Session) -> Vec<Effect> {
    let Some(entry) = session.selected_entry() else {
        return Vec::new();
    };
    if entry.is_dir {
        let dir = entry.path.clone();
        return session.visit(dir);
    }
    let path = entry.path.clone();
    session.track_recent(&path);
    session.preview_selected()
}

fn go_home(session: &mut Session) -> Vec<Effect> {
    let Some(home) = session.home.clone() else {
        session.set_status("Home directory unknown");
        return Vec::new();
    };
    info!(root = %home.display(), "new root");
    session.root = home.clone();
    session.index = None;
    session.visit(home)
}

fn mark_for_paste(session: &mut Session, mode: ClipMode) -> Vec<Effect> {
    let Some(entry) = session.selected_entry() else {
        return Vec::new();
    };
    let message = match mode {
        ClipMode::Copy => format!("Copied: {}", entry.name),
        ClipMode::Cut => format!("Cut: {}", entry.name),
    };
    session.clipboard = Some(FileClipboard {
        path: entry.path.clone(),
        mode,
    });
    session.set_status(message);
    Vec::new()
}

fn show_links(session: &mut Session) -> Vec<Effect> {
    let Some(raw) = session.preview.raw() else {
        return Vec::new();
    };
    let tokens = links::parse_links(raw);
    if tokens.is_empty() {
        session.set_status("No links found in this note");
        return Vec::new();
    }
    vec![Effect::ResolveLinks {
        tokens,
        root: session.root.clone(),
    }]
}

fn index_results(index: &TreeIndex, query: &str) -> Vec<ListItem> {
    index.search(query).into_iter().map(ListItem::File).collect()
}

fn open_list_search(session: &mut Session) -> Vec<Effect> {
    let mut search = ListSearch::default();
    let effects = match &session.index {
        Some(index) if index.root == session.root => {
            search.results = Picker::new(index_results(index, ""));
            Vec::new()
        }
        _ => {
            search.indexing = true;
            vec![Effect::BuildIndex {
                root: session.root.clone(),
            }]
        }
    };
    session.modal = Some(Modal::ListSearch(search));
    effects
}

fn on_index_built(session: &mut Session, index: TreeIndex) {
    if index.root != session.root {
        debug!(root = %index.root.display(), "dropping index of a previous root");
        return;
    }
    if let Some(Modal::ListSearch(search)) = &mut session.modal {
        search.results.set_items(index_results(&index, search.input.value()));
        search.indexing = false;
    }
    session.index = Some(index);
}

fn handle_modal_key(session: &mut Session, key: Key) -> Vec<Effect> {
    let Some(modal) = session.modal.take() else {
        return Vec::new();
    };
    let (modal, effects) = match modal {
        Modal::CreateNote(form) => create_note_key(session, form, key),
        Modal::ConfirmDelete { path, name } => match key {
            Key::Char('y') | Key::Char('Y') => (None, vec![Effect::Delete { path }]),
            Key::Char('n') | Key::Esc => (None, Vec::new()),
            _ => (Some(Modal::ConfirmDelete { path, name }), Vec::new()),
        },
        Modal::Rename {
            path,
            original,
            input,
        } => rename_key(session, path, original, input, key),
        Modal::CreateDir { input } => create_dir_key(session, input, key),
        Modal::RecentFiles(picker) => recent_key(session, picker, key),
        Modal::Bookmarks(picker) => bookmarks_key(session, picker, key),
        Modal::Help => match key {
            Key::Esc | Key::Char('?') | Key::Char('q') => (None, Vec::new()),
            _ => (Some(Modal::Help), Vec::new()),
        },
        Modal::Links(picker) => links_key(session, picker, key),
        Modal::ListSearch(search) => list_search_key(session, search, key),
        Modal::NoteSearch { input } => note_search_key(session, input, key),
        Modal::ContentSearch(search) => content_search_key(session, search, key),
    };
    session.modal = modal;
    effects
}

type ModalStep = (Option<Modal>, Vec<Effect>);

fn picker_nav(picker: &mut Picker, key: Key) -> bool {
    match key {
        Key::Down | Key::Ctrl('n') | Key::Char('j') => picker.move_by(1),
        Key::Up | Key::Ctrl('p') | Key::Char('k') => picker.move_by(-1),
        Key::PageDown => picker.move_by(10),
        Key::PageUp => picker.move_by(-10),
        Key::Char(c) => return picker.jump_to(c),
        _ => return false,
    }
    true
}

/// Arrow-only navigation for pickers that also take typed text.
fn results_nav(picker: &mut Picker, key: Key) -> bool {
    match key {
        Key::Down | Key::Ctrl('n') => picker.move_by(1),
        Key::Up | Key::Ctrl('p') => picker.move_by(-1),
        Key::PageDown => picker.move_by(10),
        Key::PageUp => picker.move_by(-10),
        _ => return false,
    }
    true
}

fn create_note_key(session: &mut Session, mut form: NoteForm, key: Key) -> ModalStep {
    let save = matches!(key, Key::Ctrl('s')) || (key == Key::Enter && form.focus == NoteField::Name);
    if save {
        if let Err(e) = validate_name(form.name.value()) {
            session.set_status(format!("Error: {}", e));
            return (Some(Modal::CreateNote(form)), Vec::new());
        }
        let effect = Effect::CreateNote {
            dir: session.current_dir.clone(),
            name: form.name.value().trim().to_string(),
            body: form.body.value().to_string(),
        };
        return (None, vec![effect]);
    }

    match key {
        Key::Esc => return (None, Vec::new()),
        Key::Tab | Key::BackTab => {
            form.focus = match form.focus {
                NoteField::Name => NoteField::Body,
                NoteField::Body => NoteField::Name,
            };
        }
        Key::Enter => form.body.insert('\n'),
        other => {
            let field = match form.focus {
                NoteField::Name => &mut form.name,
                NoteField::Body => &mut form.body,
            };
            field.handle(other);
        }
    }
    (Some(Modal::CreateNote(form)), Vec::new())
}

fn rename_key(
    session: &mut Session,
    path: PathBuf,
    original: String,
    mut input: TextInput,
    key: Key,
) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => {
            let checked = validate_name(input.value()).and_then(|name| {
                if name == original {
                    Err(FsError::UnchangedName)
                } else {
                    Ok(name.to_string())
                }
            });
            match checked {
                Ok(new_name) => (None, vec![Effect::Rename { path, new_name }]),
                Err(e) => {
                    session.set_status(format!("Error: {}", e));
                    (
                        Some(Modal::Rename {
                            path,
                            original,
                            input,
                        }),
                        Vec::new(),
                    )
                }
            }
        }
        other => {
            input.handle(other);
            (
                Some(Modal::Rename {
                    path,
                    original,
                    input,
                }),
                Vec::new(),
            )
        }
    }
}

fn create_dir_key(session: &mut Session, mut input: TextInput, key: Key) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => match validate_name(input.value()) {
            Ok(name) => {
                let effect = Effect::CreateDir {
                    dir: session.current_dir.clone(),
                    name: name.to_string(),
                };
                (None, vec![effect])
            }
            Err(e) => {
                session.set_status(format!("Error: {}", e));
                (Some(Modal::CreateDir { input }), Vec::new())
            }
        },
        other => {
            input.handle(other);
            (Some(Modal::CreateDir { input }), Vec::new())
        }
    }
}

fn recent_key(session: &mut Session, mut picker: Picker, key: Key) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => match picker.selected_item().and_then(ListItem::path) {
            Some(path) => {
                let path = path.to_path_buf();
                (None, session.reveal(&path))
            }
            None => (Some(Modal::RecentFiles(picker)), Vec::new()),
        },
        other => {
            picker_nav(&mut picker, other);
            (Some(Modal::RecentFiles(picker)), Vec::new())
        }
    }
}

fn bookmarks_key(session: &mut Session, mut picker: Picker, key: Key) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => match picker.selected_item().and_then(ListItem::path) {
            Some(path) => {
                let path = path.to_path_buf();
                (None, session.reveal(&path))
            }
            None => (Some(Modal::Bookmarks(picker)), Vec::new()),
        },
        Key::Char('D') => {
            if let Some(removed) = picker.remove_selected() {
                if let Some(path) = removed.path() {
                    session.toggle_bookmark(path);
                }
                session.set_status("Bookmark removed");
            }
            (Some(Modal::Bookmarks(picker)), Vec::new())
        }
        other => {
            picker_nav(&mut picker, other);
            (Some(Modal::Bookmarks(picker)), Vec::new())
        }
    }
}

fn links_key(session: &mut Session, mut picker: Picker, key: Key) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => match picker.selected_item() {
            Some(ListItem::Link(WikiLink {
                path: Some(path), ..
            })) => {
                let path = path.clone();
                session.track_recent(&path);
                (None, session.reveal(&path))
            }
            Some(ListItem::Link(WikiLink { token, path: None })) => {
                let effect = Effect::CreateLinkNote {
                    dir: session.current_dir.clone(),
                    token: token.clone(),
                };
                (None, vec![effect])
            }
            _ => (Some(Modal::Links(picker)), Vec::new()),
        },
        other => {
            picker_nav(&mut picker, other);
            (Some(Modal::Links(picker)), Vec::new())
        }
    }
}

fn list_search_key(session: &mut Session, mut search: ListSearch, key: Key) -> ModalStep {
    match key {
        Key::Esc => (None, Vec::new()),
        Key::Enter => {
            let Some(entry) = search.results.selected_item().and_then(ListItem::entry) else {
                return (Some(Modal::ListSearch(search)), Vec::new());
            };
            let effects = if entry.is_dir {
                let dir = entry.path.clone();
                session.visit(dir)
            } else {
                let path = entry.path.clone();
                session.reveal(&path)
            };
            (None, effects)
        }
        other => {
            if !results_nav(&mut search.results, other) && search.input.handle(other) {
                if let Some(index) = &session.index {
                    search
                        .results
                        .set_items(index_results(index, search.input.value()));
                }
            }
            (Some(Modal::ListSearch(search)), Vec::new())
        }
    }
}

fn note_search_key(session: &mut Session, mut input: TextInput, key: Key) -> ModalStep {
    match key {
        Key::Esc | Key::Enter => (None, Vec::new()),
        Key::Up => {
            session.scroll_preview(-1);
            (Some(Modal::NoteSearch { input }), Vec::new())
        }
        Key::Down => {
            session.scroll_preview(1);
            (Some(Modal::NoteSearch { input }), Vec::new())
        }
        Key::PageUp | Key::Ctrl('u') => {
            session.scroll_preview(-(session.page_size as i32 / 2).max(1));
            (Some(Modal::NoteSearch { input }), Vec::new())
        }
        Key::PageDown | Key::Ctrl('d') => {
            session.scroll_preview((session.page_size as i32 / 2).max(1));
            (Some(Modal::NoteSearch { input }), Vec::new())
        }
        other => {
            input.handle(other);
            (Some(Modal::NoteSearch { input }), Vec::new())
        }
    }
}

fn content_search_key(session: &mut Session, mut search: ContentSearch, key: Key) -> ModalStep {
    match key {
        Key::Esc => {
            let effects = if search.searching {
                // Invalidate whatever is still running.
                session.content_generation += 1;
                vec![Effect::CancelContentSearch]
            } else {
                Vec::new()
            };
            (None, effects)
        }
        Key::Enter => {
            let query = search.input.value().trim().to_string();
            if query.is_empty() {
                return (Some(Modal::ContentSearch(search)), Vec::new());
            }
            if search.last_query.as_deref() == Some(query.as_str()) && !search.searching {
                if let Some(ListItem::SearchMatch(m)) = search.results.selected_item() {
                    let path = m.path.clone();
                    let line = m.line_number.saturating_sub(1);
                    session.track_recent(&path);
                    let effects = session.reveal(&path);
                    session.pending_scroll = Some(line.min(u16::MAX as usize) as u16);
                    return (None, effects);
                }
                return (Some(Modal::ContentSearch(search)), Vec::new());
            }

            session.content_generation += 1;
            search.searching = true;
            search.last_query = Some(query.clone());
            search.results.set_items(Vec::new());
            let effect = Effect::StartContentSearch {
                root: session.root.clone(),
                query,
                generation: session.content_generation,
            };
            (Some(Modal::ContentSearch(search)), vec![effect])
        }
        other => {
            if !results_nav(&mut search.results, other) {
                search.input.handle(other);
            }
            (Some(Modal::ContentSearch(search)), Vec::new())
        }
    }
}

fn on_content_search_finished(session: &mut Session, done: ContentSearchDone) {
    if done.generation != session.content_generation {
        debug!(
            generation = done.generation,
            latest = session.content_generation,
            "dropping stale content search result"
        );
        return;
    }
    let Some(Modal::ContentSearch(search)) = &mut session.modal else {
        return;
    };
    if search.last_query.as_deref() != Some(done.query.as_str()) {
        return;
    }
    let count = done.matches.len();
    search.searching = false;
    search
        .results
        .set_items(done.matches.into_iter().map(ListItem::SearchMatch).collect());
    session.set_status(match count {
        0 => "No matches".to_string(),
        1 => "1 match".to_string(),
        n => format!("{} matches", n),
    });
}

fn on_file_op(session: &mut Session, result: Result<FileOpOutcome, String>) -> Vec<Effect> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            session.set_status(format!("Error: {}", e));
            return Vec::new();
        }
    };

    match outcome.op {
        FileOp::Delete => session.forget_path(&outcome.source),
        FileOp::Rename | FileOp::Paste(ClipMode::Cut) => {
            if let Some(path) = &outcome.path {
                session.rename_path(&outcome.source, path);
            }
            if outcome.op == FileOp::Paste(ClipMode::Cut) {
                session.clipboard = None;
            }
        }
        FileOp::CreateLinkNote => {
            if let Some(path) = &outcome.path {
                session.track_recent(path);
            }
        }
        FileOp::CreateNote | FileOp::CreateDir | FileOp::Paste(ClipMode::Copy) => {}
    }

    session.set_status(outcome.message);
    let select = outcome
        .path
        .filter(|p| p.parent() == Some(session.current_dir.as_path()));
    session.pending_select = select;
    vec![session.reload()]
}

fn on_editor_finished(
    session: &mut Session,
    path: PathBuf,
    result: Result<(), String>,
) -> Vec<Effect> {
    if let Err(e) = result {
        session.set_status(format!("Editor error: {}", e));
        return Vec::new();
    }
    session.track_recent(&path);
    let mut effects = vec![session.reload()];
    if session.preview.path.as_deref() == Some(path.as_path()) {
        effects.push(Effect::LoadNote {
            path,
            root: session.root.clone(),
        });
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::effects::{run, tests::Recorder};
    use crate::app::state::SessionInit;
    use crate::search::SearchMatch;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    /// Run `effects` and feed their outcomes back until nothing is left to do.
    fn settle(session: &mut Session, rec: &mut Recorder, effects: Vec<Effect>) {
        let mut queue: VecDeque<Event> = effects.into_iter().filter_map(|e| run(e, rec)).collect();
        while let Some(event) = queue.pop_front() {
            for effect in dispatch(session, event) {
                if let Some(next) = run(effect, rec) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn pump(session: &mut Session, rec: &mut Recorder, event: Event) {
        let effects = dispatch(session, event);
        settle(session, rec, effects);
    }

    fn press(session: &mut Session, rec: &mut Recorder, keys: &[Key]) {
        for key in keys {
            pump(session, rec, Event::Key(*key));
        }
    }

    fn type_text(session: &mut Session, rec: &mut Recorder, text: &str) {
        for c in text.chars() {
            pump(session, rec, Event::Key(Key::Char(c)));
        }
    }

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("d1")).unwrap();
        fs::create_dir_all(dir.path().join("d2")).unwrap();
        fs::create_dir_all(dir.path().join("d3")).unwrap();
        fs::write(dir.path().join("d1/one.md"), "# One\n\nSee [[two]] and [[Ghost]]").unwrap();
        fs::write(dir.path().join("d2/two.md"), "# Two").unwrap();
        fs::write(dir.path().join("readme.md"), "hello").unwrap();
        dir
    }

    fn browsing(root: &Path) -> (Session, Recorder) {
        let mut session = Session::new(SessionInit {
            home: Some(root.to_path_buf()),
            ..SessionInit::new(root.to_path_buf())
        });
        let mut rec = Recorder::default();
        pump(&mut session, &mut rec, Event::Key(Key::Enter));
        assert_eq!(session.screen, Screen::Browsing);
        (session, rec)
    }

    fn select_named(session: &mut Session, rec: &mut Recorder, name: &str) {
        let idx = session
            .items
            .iter()
            .position(|i| i.entry().map(|e| e.name.as_str()) == Some(name))
            .unwrap();
        let effects = session.select(idx);
        settle(session, rec, effects);
    }

    fn names(session: &Session) -> Vec<String> {
        session
            .items
            .iter()
            .filter_map(|i| i.entry().map(|e| e.name.clone()))
            .collect()
    }

    #[test]
    fn test_history_visit_back_then_visit_drops_forward() {
        let dir = vault();
        let root = dir.path();
        let (mut s, mut rec) = browsing(root);

        for d in ["d1", "d2"] {
            let effects = s.visit(root.join(d));
            settle(&mut s, &mut rec, effects);
        }
        press(&mut s, &mut rec, &[Key::Ctrl('o')]);
        assert_eq!(s.current_dir, root.join("d1"));
        assert_eq!(names(&s), vec!["one.md"]);

        let effects = s.visit(root.join("d3"));
        settle(&mut s, &mut rec, effects);
        assert!(!s.history.forward());
        assert_eq!(s.current_dir, root.join("d3"));
    }

    #[test]
    fn test_back_then_forward_restores_directory() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "d1");
        press(&mut s, &mut rec, &[Key::Enter]);
        assert_eq!(s.current_dir, dir.path().join("d1"));

        press(&mut s, &mut rec, &[Key::Ctrl('o'), Key::Tab]);
        assert_eq!(s.current_dir, dir.path().join("d1"));
        assert_eq!(names(&s), vec!["one.md"]);
    }

    #[test]
    fn test_quit_only_without_modal() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());

        press(&mut s, &mut rec, &[Key::Char('?'), Key::Char('q')]);
        assert!(!s.should_quit);
        assert!(s.modal.is_none());

        press(&mut s, &mut rec, &[Key::Char('n'), Key::Char('q')]);
        assert!(!s.should_quit);
        match &s.modal {
            Some(Modal::CreateNote(form)) => assert_eq!(form.name.value(), "q"),
            other => panic!("unexpected modal: {:?}", other),
        }

        press(&mut s, &mut rec, &[Key::Esc, Key::Char('q')]);
        assert!(s.should_quit);
    }

    #[test]
    fn test_opening_keys_are_ignored_while_modal_open() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());

        press(&mut s, &mut rec, &[Key::Char('N'), Key::Char('?'), Key::Char('B')]);
        match &s.modal {
            Some(Modal::CreateDir { input }) => assert_eq!(input.value(), "?B"),
            other => panic!("unexpected modal: {:?}", other),
        }
    }

    #[test]
    fn test_home_screen_keys() {
        let dir = vault();
        let mut s = Session::new(SessionInit {
            theme_count: 3,
            ..SessionInit::new(dir.path().to_path_buf())
        });
        let mut rec = Recorder::default();

        press(&mut s, &mut rec, &[Key::Char('t'), Key::Char('j')]);
        assert_eq!(s.theme_index, 1);
        assert_eq!(s.screen, Screen::Home);
        assert!(s.items.is_empty());

        press(&mut s, &mut rec, &[Key::Enter]);
        assert_eq!(names(&s), vec!["d1", "d2", "d3", "readme.md"]);
    }

    #[test]
    fn test_auto_preview_renders_links() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "d1");
        press(&mut s, &mut rec, &[Key::Enter]);

        assert_eq!(s.preview.path, Some(dir.path().join("d1/one.md")));
        let content = s.preview.content.as_ref().unwrap();
        assert!(content.rendered.contains("[🔗 two]("));
        assert!(content.rendered.contains("[❓ Ghost](missing)"));
    }

    #[test]
    fn test_create_note_rejects_empty_name_and_stays_open() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());

        press(&mut s, &mut rec, &[Key::Char('n'), Key::Char(' '), Key::Enter]);
        assert!(matches!(s.modal, Some(Modal::CreateNote(_))));
        assert_eq!(s.status.as_ref().unwrap().text, "Error: name cannot be empty");

        press(&mut s, &mut rec, &[Key::Backspace]);
        type_text(&mut s, &mut rec, "idea");
        press(&mut s, &mut rec, &[Key::Tab]);
        type_text(&mut s, &mut rec, "first line");
        press(&mut s, &mut rec, &[Key::Ctrl('s')]);

        assert!(s.modal.is_none());
        let created = dir.path().join("idea.md");
        assert_eq!(fs::read_to_string(&created).unwrap(), "# idea\n\nfirst line\n");
        assert_eq!(s.selected_entry().map(|e| e.path.clone()), Some(created));
    }

    #[test]
    fn test_rename_validation_and_success() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");

        press(&mut s, &mut rec, &[Key::Char('r'), Key::Enter]);
        assert!(matches!(s.modal, Some(Modal::Rename { .. })));
        assert_eq!(s.status.as_ref().unwrap().text, "Error: name is unchanged");

        press(&mut s, &mut rec, &[Key::Ctrl('w')]);
        type_text(&mut s, &mut rec, "intro.md");
        press(&mut s, &mut rec, &[Key::Enter]);

        assert!(s.modal.is_none());
        assert!(dir.path().join("intro.md").exists());
        assert!(!dir.path().join("readme.md").exists());
        assert_eq!(s.selected_entry().unwrap().name, "intro.md");
    }

    #[test]
    fn test_failed_operation_keeps_navigation() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "d1");

        // Pasting next to the original collides with it.
        press(&mut s, &mut rec, &[Key::Char('c'), Key::Char('p')]);
        assert_eq!(s.current_dir, dir.path());
        assert_eq!(s.status.as_ref().unwrap().text, "Error: already exists: d1");
        assert_eq!(s.history.current(), Some(dir.path()));
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        press(&mut s, &mut rec, &[Key::Char('p')]);
        assert_eq!(s.status.as_ref().unwrap().text, "Error: clipboard is empty");
        assert_eq!(names(&s), vec!["d1", "d2", "d3", "readme.md"]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");

        press(&mut s, &mut rec, &[Key::Char('D'), Key::Char('x')]);
        assert!(matches!(s.modal, Some(Modal::ConfirmDelete { .. })));
        press(&mut s, &mut rec, &[Key::Char('n')]);
        assert!(dir.path().join("readme.md").exists());

        press(&mut s, &mut rec, &[Key::Char('D'), Key::Char('y')]);
        assert!(!dir.path().join("readme.md").exists());
        assert_eq!(names(&s), vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn test_cut_and_paste_moves_file() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");
        press(&mut s, &mut rec, &[Key::Char('x')]);

        select_named(&mut s, &mut rec, "d3");
        press(&mut s, &mut rec, &[Key::Enter, Key::Char('p')]);

        assert!(dir.path().join("d3/readme.md").exists());
        assert!(!dir.path().join("readme.md").exists());
        assert!(s.clipboard.is_none());
        assert_eq!(s.status.as_ref().unwrap().text, "Moved: readme.md");
        assert_eq!(s.selected_entry().unwrap().name, "readme.md");
    }

    #[test]
    fn test_filters_and_sort_keys() {
        let dir = vault();
        fs::write(dir.path().join("image.png"), "png").unwrap();
        fs::write(dir.path().join(".hidden.md"), "").unwrap();
        let (mut s, mut rec) = browsing(dir.path());
        assert_eq!(names(&s), vec!["d1", "d2", "d3", "image.png", "readme.md"]);

        press(&mut s, &mut rec, &[Key::Char('m')]);
        assert_eq!(names(&s), vec!["d1", "d2", "d3", "readme.md"]);

        press(&mut s, &mut rec, &[Key::Char('.')]);
        assert_eq!(names(&s), vec![".hidden.md", "d1", "d2", "d3", "readme.md"]);

        press(&mut s, &mut rec, &[Key::Char('s'), Key::Char('s')]);
        assert_eq!(s.filters.badges(), vec!["[.md only]", "[hidden]", "[↓ size]"]);
    }

    #[test]
    fn test_links_modal_opens_and_creates_missing_note() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "d1");
        press(&mut s, &mut rec, &[Key::Enter, Key::Char('L')]);

        let Some(Modal::Links(picker)) = &s.modal else {
            panic!("links modal not open: {:?}", s.modal);
        };
        assert_eq!(picker.items.len(), 2);

        press(&mut s, &mut rec, &[Key::Down, Key::Enter]);
        let created = dir.path().join("d1/Ghost.md");
        assert_eq!(fs::read_to_string(&created).unwrap(), "# Ghost\n\n");
        assert_eq!(s.selected_entry().unwrap().path, created);
        assert_eq!(s.recent_files.first(), Some(&created));

        select_named(&mut s, &mut rec, "one.md");
        press(&mut s, &mut rec, &[Key::Char('L'), Key::Enter]);
        assert_eq!(s.current_dir, dir.path().join("d2"));
        assert_eq!(s.preview.path, Some(dir.path().join("d2/two.md")));
    }

    #[test]
    fn test_created_link_note_resolves_through_alias() {
        let dir = vault();
        let root = dir.path();
        fs::write(root.join("d3/alias.md"), "[[Ghost|the ghost]] and [[../escape]]").unwrap();
        let (mut s, mut rec) = browsing(root);
        select_named(&mut s, &mut rec, "d3");
        press(&mut s, &mut rec, &[Key::Enter]);
        select_named(&mut s, &mut rec, "alias.md");
        press(&mut s, &mut rec, &[Key::Char('L'), Key::Enter]);

        let created = root.join("d3/Ghost.md");
        assert_eq!(fs::read_to_string(&created).unwrap(), "# Ghost\n\n");
        assert_eq!(crate::links::resolve("Ghost|the ghost", root), Some(created));

        select_named(&mut s, &mut rec, "alias.md");
        press(&mut s, &mut rec, &[Key::Char('L'), Key::Down, Key::Enter]);
        assert!(s.status.as_ref().unwrap().text.starts_with("Error: invalid name"));
        assert!(!root.join("escape.md").exists());
    }

    #[test]
    fn test_links_without_any_link_sets_status() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");
        press(&mut s, &mut rec, &[Key::Char('L')]);
        assert!(s.modal.is_none());
        assert_eq!(s.status.as_ref().unwrap().text, "No links found in this note");
    }

    #[test]
    fn test_list_search_uses_tree_index() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        assert!(s.index.is_none());

        press(&mut s, &mut rec, &[Key::Char('/')]);
        assert!(s.index.is_some());
        type_text(&mut s, &mut rec, "two");

        let Some(Modal::ListSearch(search)) = &s.modal else {
            panic!("list search not open");
        };
        assert!(!search.indexing);
        let first = search.results.selected_item().and_then(ListItem::path);
        assert_eq!(first, Some(dir.path().join("d2/two.md").as_path()));

        press(&mut s, &mut rec, &[Key::Enter]);
        assert_eq!(s.current_dir, dir.path().join("d2"));
        assert_eq!(s.selected_entry().unwrap().name, "two.md");
    }

    #[test]
    fn test_bookmarks_and_recent_pickers() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");
        press(&mut s, &mut rec, &[Key::Char('b'), Key::Enter]);
        assert_eq!(s.bookmarks, vec![dir.path().join("readme.md")]);
        assert_eq!(s.recent_files, vec![dir.path().join("readme.md")]);

        select_named(&mut s, &mut rec, "d1");
        press(&mut s, &mut rec, &[Key::Enter, Key::Char('B')]);
        assert!(matches!(s.modal, Some(Modal::Bookmarks(_))));
        press(&mut s, &mut rec, &[Key::Enter]);
        assert_eq!(s.current_dir, dir.path());
        assert_eq!(s.selected_entry().unwrap().name, "readme.md");

        press(&mut s, &mut rec, &[Key::Char('B'), Key::Char('D'), Key::Esc]);
        assert!(s.bookmarks.is_empty());

        press(&mut s, &mut rec, &[Key::Ctrl('r')]);
        let Some(Modal::RecentFiles(picker)) = &s.modal else {
            panic!("recent files not open");
        };
        assert_eq!(picker.items.len(), 1);
    }

    #[test]
    fn test_content_search_drops_stale_results() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());

        press(&mut s, &mut rec, &[Key::Ctrl('f')]);
        type_text(&mut s, &mut rec, "hel");
        press(&mut s, &mut rec, &[Key::Enter]);
        type_text(&mut s, &mut rec, "lo");
        press(&mut s, &mut rec, &[Key::Enter]);
        assert_eq!(rec.searches.len(), 2);
        assert_eq!(rec.searches[1].1, "hello");
        assert_eq!(s.content_generation, 2);

        let found = |query: &str, generation| ContentSearchDone {
            generation,
            query: query.to_string(),
            matches: vec![SearchMatch {
                path: dir.path().join("readme.md"),
                line_number: 1,
                line: "hello".into(),
            }],
        };
        pump(&mut s, &mut rec, Event::ContentSearchFinished(found("hel", 1)));
        let Some(Modal::ContentSearch(search)) = &s.modal else {
            panic!("content search not open");
        };
        assert!(search.searching);
        assert!(search.results.items.is_empty());

        pump(&mut s, &mut rec, Event::ContentSearchFinished(found("hello", 2)));
        let Some(Modal::ContentSearch(search)) = &s.modal else {
            panic!("content search not open");
        };
        assert!(!search.searching);
        assert_eq!(search.results.items.len(), 1);

        press(&mut s, &mut rec, &[Key::Enter]);
        assert!(s.modal.is_none());
        assert_eq!(s.selected_entry().unwrap().name, "readme.md");
    }

    #[test]
    fn test_closing_content_search_cancels_it() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        press(&mut s, &mut rec, &[Key::Ctrl('f')]);
        type_text(&mut s, &mut rec, "x");
        press(&mut s, &mut rec, &[Key::Enter, Key::Esc]);
        assert_eq!(rec.cancelled, 1);
        assert_eq!(s.content_generation, 2);
    }

    #[test]
    fn test_note_search_needs_open_note() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "d1");
        s.preview = Default::default();
        press(&mut s, &mut rec, &[Key::Char('F')]);
        assert!(s.modal.is_none());

        select_named(&mut s, &mut rec, "readme.md");
        press(&mut s, &mut rec, &[Key::Char('F')]);
        type_text(&mut s, &mut rec, "ell");
        assert_eq!(s.note_search_query(), Some("ell"));
        press(&mut s, &mut rec, &[Key::Esc]);
        assert_eq!(s.note_search_query(), None);
    }

    #[test]
    fn test_gg_and_g_navigation() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        press(&mut s, &mut rec, &[Key::Char('G')]);
        assert_eq!(s.selected, 3);
        press(&mut s, &mut rec, &[Key::Char('g'), Key::Char('j')]);
        assert_eq!(s.selected, 3);
        press(&mut s, &mut rec, &[Key::Char('g'), Key::Char('g')]);
        assert_eq!(s.selected, 0);
    }

    #[test]
    fn test_editor_and_clipboard_keys() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        select_named(&mut s, &mut rec, "readme.md");
        press(&mut s, &mut rec, &[Key::Char('e'), Key::Char('y')]);
        assert_eq!(rec.edited, vec![dir.path().join("readme.md")]);
        assert_eq!(
            rec.clipboard,
            vec![dir.path().join("readme.md").display().to_string()]
        );
        assert_eq!(s.status.as_ref().unwrap().text, "Path copied to clipboard");
    }

    #[test]
    fn test_refresh_rebuilds_index() {
        let dir = vault();
        let (mut s, mut rec) = browsing(dir.path());
        press(&mut s, &mut rec, &[Key::Char('/'), Key::Esc]);
        fs::write(dir.path().join("late.md"), "").unwrap();

        press(&mut s, &mut rec, &[Key::Char('R')]);
        let index = s.index.as_ref().unwrap();
        assert!(!index.search("late").is_empty());
        assert!(names(&s).contains(&"late.md".to_string()));
    }
}
