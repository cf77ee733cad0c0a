use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NOTESMD_LOG";
const DEFAULT_FILTER: &str = "notesmd=info";

pub fn log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("notesmd")
        .join("notesmd.log")
}

/// Send tracing output to the log file; the terminal belongs to the UI.
///
/// Level filtering follows `NOTESMD_LOG` (e.g. `notesmd=debug`).
pub fn init() -> io::Result<PathBuf> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}
