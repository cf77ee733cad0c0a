//! The terminal event loop: reads keys, runs effects, draws.

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self as term, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::app::{dispatch, run, Collaborators, Event, Key, Session};
use crate::clipboard::{ClipboardError, SystemClipboard};
use crate::editor;
use crate::search::ContentSearchWorker;
use crate::ui;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the loop hands to effects that need the world outside the session.
struct Runtime<'a> {
    terminal: &'a mut Tui,
    editor: String,
    clipboard: SystemClipboard,
    search: ContentSearchWorker,
}

impl Collaborators for Runtime<'_> {
    fn open_editor(&mut self, path: &Path) -> io::Result<()> {
        suspend(self.terminal)?;
        let result = editor::edit(&self.editor, path);
        resume(self.terminal)?;
        result
    }

    fn set_clipboard(&mut self, text: String) -> Result<(), ClipboardError> {
        self.clipboard.set_text(text)
    }

    fn start_content_search(
        &mut self,
        root: PathBuf,
        query: String,
        generation: u64,
    ) -> io::Result<()> {
        self.search.start(root, query, generation)
    }

    fn cancel_content_search(&mut self) {
        self.search.cancel();
    }
}

/// Give the terminal back to a foreground child process.
fn suspend(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn resume(terminal: &mut Tui) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    terminal.clear()
}

pub fn run_app(terminal: &mut Tui, session: &mut Session, editor: String) -> io::Result<()> {
    let height = terminal.size()?.height;
    let mut runtime = Runtime {
        terminal,
        editor,
        clipboard: SystemClipboard::new(),
        search: ContentSearchWorker::new(),
    };

    let mut queue = VecDeque::new();
    queue.push_back(Event::Resize {
        height: ui::list_rows(height),
    });

    loop {
        while let Some(event) = queue.pop_front() {
            for effect in dispatch(session, event) {
                debug!(?effect, "running effect");
                if let Some(next) = run(effect, &mut runtime) {
                    queue.push_back(next);
                }
            }
        }

        if session.should_quit {
            runtime.search.cancel();
            return Ok(());
        }

        while let Some(done) = runtime.search.try_recv() {
            queue.push_back(Event::ContentSearchFinished(done));
        }
        if !queue.is_empty() {
            continue;
        }

        session.expire_status(Instant::now());
        runtime.terminal.draw(|f| ui::draw(f, session))?;

        if term::poll(POLL_INTERVAL)? {
            match term::read()? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    queue.push_back(Event::Key(Key::from(key)));
                }
                TermEvent::Resize(_, height) => {
                    queue.push_back(Event::Resize {
                        height: ui::list_rows(height),
                    });
                }
                _ => {}
            }
        }
    }
}
