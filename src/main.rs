mod app;
mod browser;
mod clipboard;
mod config;
mod editor;
mod error;
mod event;
mod files;
mod links;
mod logging;
mod search;
mod ui;

use std::env;
use std::io;
use std::path::PathBuf;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};

use app::{Session, SessionInit};
use config::{Config, SessionState};
use event::run_app;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!("notesmd {}", VERSION);
    println!("A terminal navigator for markdown note trees");
    println!();
    println!("USAGE:");
    println!("    notesmd [OPTIONS] [PATH]");
    println!();
    println!("ARGUMENTS:");
    println!("    [PATH]           Directory to browse");
    println!("                     - If PATH is a file, its directory is used");
    println!("                     - Without PATH, the last directory is reopened");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
    println!("    -c, --config     Print config file path");
    println!();
    println!("ENVIRONMENT:");
    println!("    EDITOR           Editor used by 'e' when none is configured");
    println!("    NOTESMD_LOG      Log filter, e.g. notesmd=debug");
    println!();
    println!("EXAMPLES:");
    println!("    notesmd ~/notes          Browse the ~/notes folder");
    println!("    notesmd .                Browse the current directory");
}

fn resolve_path(path_str: &str) -> Option<PathBuf> {
    let expanded = shellexpand::tilde(path_str).to_string();
    let path = PathBuf::from(&expanded);
    let absolute = if path.is_absolute() {
        path
    } else {
        env::current_dir().ok()?.join(path)
    };

    absolute.canonicalize().ok().or(Some(absolute))
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut initial_dir: Option<PathBuf> = None;

    if args.len() > 1 {
        match args[1].as_str() {
            "-v" | "--version" => {
                println!("notesmd {}", VERSION);
                return Ok(());
            }
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-c" | "--config" => {
                println!("{}", Config::config_path().display());
                return Ok(());
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Run 'notesmd --help' for usage information");
                return Ok(());
            }
            path_arg => match resolve_path(path_arg) {
                Some(path) if path.is_dir() => initial_dir = Some(path),
                Some(path) if path.exists() => initial_dir = path.parent().map(PathBuf::from),
                Some(path) => {
                    eprintln!("Path does not exist: {}", path.display());
                    return Ok(());
                }
                None => {
                    eprintln!("Invalid path: {}", path_arg);
                    return Ok(());
                }
            },
        }
    }

    if let Err(e) = logging::init() {
        eprintln!("notesmd: logging disabled: {}", e);
    }

    let config = Config::load();
    let state = SessionState::load();
    let root = config::start_directory(initial_dir, &state, &config);
    info!(version = VERSION, root = %root.display(), "starting");

    let theme_count = ui::theme::theme_count();
    let mut session = Session::new(SessionInit {
        home: dirs::home_dir(),
        filters: config.filters.to_filters(),
        theme_index: state.theme_index(&config, theme_count),
        theme_count,
        bookmarks: state.bookmarks.clone(),
        recent_files: state.recent_files.clone(),
        max_recent: config.search.max_recent_files,
        ..SessionInit::new(root)
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut session, config.editor_command());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let saved = SessionState {
        last_directory: Some(session.current_dir.clone()),
        last_theme: Some(session.theme_index),
        recent_files: session.recent_files.clone(),
        bookmarks: session.bookmarks.clone(),
    };
    if let Err(e) = saved.save() {
        warn!(error = %e, "could not save session");
    }

    if let Err(err) = result {
        error!(error = %err, "event loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}
