//! Side effects requested by the session and the code that performs them.
//!
//! [`dispatch`](super::dispatch) never touches the filesystem. It returns
//! [`Effect`]s; the event loop hands each to [`run`], which does the work and
//! reports back with the [`Event`] to feed into the next dispatch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::dispatch::Event;
use super::state::{NoteContent, PickerKind};
use crate::clipboard::ClipboardError;
use crate::files::{self, ClipMode, Entry, FileClipboard};
use crate::links;
use crate::search::TreeIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ReadDir { dir: PathBuf },
    LoadNote { path: PathBuf, root: PathBuf },
    BuildIndex { root: PathBuf },
    ResolveLinks { tokens: Vec<String>, root: PathBuf },
    LoadPicker { kind: PickerKind, paths: Vec<PathBuf> },
    CreateNote { dir: PathBuf, name: String, body: String },
    CreateLinkNote { dir: PathBuf, token: String },
    CreateDir { dir: PathBuf, name: String },
    Rename { path: PathBuf, new_name: String },
    Delete { path: PathBuf },
    Paste { clip: FileClipboard, dest: PathBuf },
    OpenEditor { path: PathBuf },
    CopyPath { path: PathBuf },
    CopyContent { path: PathBuf },
    StartContentSearch { root: PathBuf, query: String, generation: u64 },
    CancelContentSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    CreateNote,
    CreateLinkNote,
    CreateDir,
    Rename,
    Delete,
    Paste(ClipMode),
}

/// A file operation that went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOpOutcome {
    pub op: FileOp,
    /// The path the operation acted on before it ran
    pub source: PathBuf,
    /// The path that exists afterwards, if any
    pub path: Option<PathBuf>,
    pub message: String,
}

/// The outside world the session reaches through the event loop.
pub trait Collaborators {
    /// Run the external editor on `path`, blocking until it exits.
    fn open_editor(&mut self, path: &Path) -> io::Result<()>;

    fn set_clipboard(&mut self, text: String) -> Result<(), ClipboardError>;

    fn start_content_search(&mut self, root: PathBuf, query: String, generation: u64)
        -> io::Result<()>;

    fn cancel_content_search(&mut self);
}

pub fn load_note(path: &Path, root: &Path) -> Result<NoteContent, String> {
    let bytes = fs::read(path).map_err(|e| format!("Cannot read {}:\n\n{}", path.display(), e))?;
    let raw = String::from_utf8_lossy(&bytes).into_owned();
    let rendered = if files::has_note_extension(path) {
        links::rewrite(&raw, root)
    } else {
        raw.clone()
    };
    Ok(NoteContent { raw, rendered })
}

fn load_entries(paths: &[PathBuf]) -> Vec<Entry> {
    paths
        .iter()
        .filter_map(|path| match fs::metadata(path) {
            Ok(metadata) => Some(Entry::from_metadata(path.clone(), &metadata)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping missing entry");
                None
            }
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_op(effect: Effect) -> Result<FileOpOutcome, String> {
    let outcome = match effect {
        Effect::CreateNote { dir, name, body } => {
            let path = files::create_note(&dir, &name, &body).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::CreateNote,
                message: format!("Created: {}", display_name(&path)),
                source: dir,
                path: Some(path),
            }
        }
        Effect::CreateLinkNote { dir, token } => {
            let path = files::create_link_note(&dir, &token).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::CreateLinkNote,
                message: format!("Created: {}", display_name(&path)),
                source: dir,
                path: Some(path),
            }
        }
        Effect::CreateDir { dir, name } => {
            let path = files::create_dir(&dir, &name).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::CreateDir,
                message: format!("Created directory: {}", display_name(&path)),
                source: dir,
                path: Some(path),
            }
        }
        Effect::Rename { path, new_name } => {
            let renamed = files::rename(&path, &new_name).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::Rename,
                message: format!("Renamed to: {}", display_name(&renamed)),
                source: path,
                path: Some(renamed),
            }
        }
        Effect::Delete { path } => {
            files::delete(&path).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::Delete,
                message: format!("Deleted: {}", display_name(&path)),
                source: path,
                path: None,
            }
        }
        Effect::Paste { clip, dest } => {
            let pasted = files::paste(&clip, &dest).map_err(|e| e.to_string())?;
            FileOpOutcome {
                op: FileOp::Paste(clip.mode),
                message: pasted.message,
                source: clip.path,
                path: Some(pasted.path),
            }
        }
        other => return Err(format!("not a file operation: {:?}", other)),
    };
    Ok(outcome)
}

/// Perform `effect` and return the event describing its outcome.
pub fn run(effect: Effect, collab: &mut impl Collaborators) -> Option<Event> {
    match effect {
        Effect::ReadDir { dir } => {
            let entries = files::read_snapshot(&dir);
            Some(Event::DirLoaded { dir, entries })
        }
        Effect::LoadNote { path, root } => {
            let content = load_note(&path, &root);
            Some(Event::NoteLoaded { path, content })
        }
        Effect::BuildIndex { root } => Some(Event::IndexBuilt(TreeIndex::build(&root))),
        Effect::ResolveLinks { tokens, root } => {
            Some(Event::LinksResolved(links::resolve_all(&tokens, &root)))
        }
        Effect::LoadPicker { kind, paths } => Some(Event::PickerLoaded {
            kind,
            entries: load_entries(&paths),
        }),
        op @ (Effect::CreateNote { .. }
        | Effect::CreateLinkNote { .. }
        | Effect::CreateDir { .. }
        | Effect::Rename { .. }
        | Effect::Delete { .. }
        | Effect::Paste { .. }) => {
            let result = file_op(op);
            if let Err(e) = &result {
                warn!(error = %e, "file operation failed");
            }
            Some(Event::FileOpFinished(result))
        }
        Effect::OpenEditor { path } => {
            let result = collab.open_editor(&path).map_err(|e| e.to_string());
            Some(Event::EditorFinished { path, result })
        }
        Effect::CopyPath { path } => {
            let message = match collab.set_clipboard(path.display().to_string()) {
                Ok(()) => "Path copied to clipboard".to_string(),
                Err(e) => format!("Error: {}", e),
            };
            Some(Event::Notice(message))
        }
        Effect::CopyContent { path } => {
            let message = match fs::read_to_string(&path) {
                Ok(content) => match collab.set_clipboard(content) {
                    Ok(()) => "Content copied to clipboard".to_string(),
                    Err(e) => format!("Error: {}", e),
                },
                Err(e) => format!("Error: cannot read {}: {}", display_name(&path), e),
            };
            Some(Event::Notice(message))
        }
        Effect::StartContentSearch {
            root,
            query,
            generation,
        } => match collab.start_content_search(root, query, generation) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "could not start content search");
                Some(Event::Notice(format!("Error: search failed to start: {}", e)))
            }
        },
        Effect::CancelContentSearch => {
            collab.cancel_content_search();
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Records what the session asked of the outside world.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub edited: Vec<PathBuf>,
        pub clipboard: Vec<String>,
        pub searches: Vec<(PathBuf, String, u64)>,
        pub cancelled: usize,
    }

    impl Collaborators for Recorder {
        fn open_editor(&mut self, path: &Path) -> io::Result<()> {
            self.edited.push(path.to_path_buf());
            Ok(())
        }

        fn set_clipboard(&mut self, text: String) -> Result<(), ClipboardError> {
            self.clipboard.push(text);
            Ok(())
        }

        fn start_content_search(
            &mut self,
            root: PathBuf,
            query: String,
            generation: u64,
        ) -> io::Result<()> {
            self.searches.push((root, query, generation));
            Ok(())
        }

        fn cancel_content_search(&mut self) {
            self.cancelled += 1;
        }
    }

    #[test]
    fn test_load_note_rewrites_links() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "see [[b]]").unwrap();
        fs::write(dir.path().join("b.md"), "").unwrap();
        fs::write(dir.path().join("plain.txt"), "see [[b]]").unwrap();

        let note = load_note(&dir.path().join("a.md"), dir.path()).unwrap();
        assert_eq!(note.raw, "see [[b]]");
        assert!(note.rendered.starts_with("see [🔗 b]("));

        let plain = load_note(&dir.path().join("plain.txt"), dir.path()).unwrap();
        assert_eq!(plain.rendered, "see [[b]]");

        assert!(load_note(&dir.path().join("gone.md"), dir.path()).is_err());
    }

    #[test]
    fn test_file_ops_report_outcomes() {
        let dir = TempDir::new().unwrap();
        let mut rec = Recorder::default();

        let event = run(
            Effect::CreateNote {
                dir: dir.path().to_path_buf(),
                name: "idea".into(),
                body: "body".into(),
            },
            &mut rec,
        );
        let Some(Event::FileOpFinished(Ok(outcome))) = event else {
            panic!("unexpected event: {:?}", event);
        };
        assert_eq!(outcome.op, FileOp::CreateNote);
        assert_eq!(outcome.path, Some(dir.path().join("idea.md")));
        assert_eq!(outcome.message, "Created: idea.md");

        let event = run(
            Effect::CreateNote {
                dir: dir.path().to_path_buf(),
                name: "idea.md".into(),
                body: String::new(),
            },
            &mut rec,
        );
        let Some(Event::FileOpFinished(Err(message))) = event else {
            panic!("unexpected event: {:?}", event);
        };
        assert_eq!(message, "already exists: idea.md");
    }

    #[test]
    fn test_copy_effects_go_through_collaborators() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "content").unwrap();
        let mut rec = Recorder::default();

        run(Effect::CopyPath { path: path.clone() }, &mut rec);
        let event = run(Effect::CopyContent { path: path.clone() }, &mut rec);
        assert!(matches!(event, Some(Event::Notice(m)) if m == "Content copied to clipboard"));
        assert_eq!(rec.clipboard, vec![path.display().to_string(), "content".to_string()]);

        let event = run(Effect::OpenEditor { path: path.clone() }, &mut rec);
        assert!(matches!(event, Some(Event::EditorFinished { result: Ok(()), .. })));
        assert_eq!(rec.edited, vec![path]);
    }

    #[test]
    fn test_picker_skips_missing_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        let mut rec = Recorder::default();

        let event = run(
            Effect::LoadPicker {
                kind: PickerKind::Recent,
                paths: vec![dir.path().join("a.md"), dir.path().join("gone.md")],
            },
            &mut rec,
        );
        let Some(Event::PickerLoaded { kind, entries }) = event else {
            panic!("unexpected event: {:?}", event);
        };
        assert_eq!(kind, PickerKind::Recent);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.md");
    }
}
