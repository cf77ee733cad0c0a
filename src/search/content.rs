//! Full-text search across every note below a root.
//!
//! A walker feeds note paths into a bounded queue drained by a fixed pool of
//! worker threads. Each worker produces the matches of one file at a time and
//! sends them back over a channel; the caller only gets the concatenated list
//! once every worker has exited.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::files::has_note_extension;

/// Upper bound on matches reported for a single file.
pub const MAX_MATCHES_PER_FILE: usize = 5;
const QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based
    pub line_number: usize,
    /// The matching line, trimmed
    pub line: String,
}

/// Cancellation handle shared between a search and whoever started it.
///
/// A token stays live while the shared active version equals its own; bumping
/// the version cancels every older token at once.
#[derive(Debug, Clone)]
pub struct CancelToken {
    version: u64,
    active: Arc<AtomicU64>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.active.load(Ordering::Relaxed) != self.version
    }
}

/// Case-insensitive line scan of one file, stopping after
/// [`MAX_MATCHES_PER_FILE`] hits. Lines are decoded lossily, so stray
/// non-UTF-8 bytes never hide later matches. An I/O error ends the scan of
/// this file and keeps what was found so far.
pub fn search_file(path: &Path, query_lower: &str) -> Vec<SearchMatch> {
    let mut matches = Vec::new();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return matches;
        }
    };

    for (idx, bytes) in BufReader::new(file).split(b'\n').enumerate() {
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stopped reading file");
                break;
            }
        };
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(&bytes);
        let line = String::from_utf8_lossy(bytes);
        if line.to_lowercase().contains(query_lower) {
            matches.push(SearchMatch {
                path: path.to_path_buf(),
                line_number: idx + 1,
                line: line.trim().to_string(),
            });
            if matches.len() >= MAX_MATCHES_PER_FILE {
                break;
            }
        }
    }

    matches
}

fn worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Search every `.md` file below `root` for `query`, ignoring case.
///
/// Workers stop picking up files once `token` is cancelled; a cancelled
/// search returns whatever was already collected.
pub fn search_content(root: &Path, query: &str, token: &CancelToken) -> Vec<SearchMatch> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Vec::new();
    }

    let (job_tx, job_rx) = mpsc::sync_channel::<PathBuf>(QUEUE_CAPACITY);
    let job_rx = Mutex::new(job_rx);
    let (result_tx, result_rx) = mpsc::channel::<Vec<SearchMatch>>();
    let workers = worker_count();

    let mut results = Vec::new();
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = &job_rx;
            let result_tx = result_tx.clone();
            let query_lower = query_lower.as_str();
            scope.spawn(move || loop {
                let next = match job_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let Ok(path) = next else { break };
                if token.is_cancelled() {
                    continue;
                }
                let matches = search_file(&path, query_lower);
                if !matches.is_empty() && result_tx.send(matches).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);

        scope.spawn(move || {
            let notes = WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| !e.file_type().is_dir() && has_note_extension(e.path()));
            for entry in notes {
                if token.is_cancelled() || job_tx.send(entry.into_path()).is_err() {
                    break;
                }
            }
        });

        // Ends once every worker has dropped its sender.
        for batch in result_rx {
            results.extend(batch);
        }
    });

    results
}

/// The outcome of one background search, tagged with the generation that started it.
#[derive(Debug, Clone)]
pub struct ContentSearchDone {
    pub generation: u64,
    pub query: String,
    pub matches: Vec<SearchMatch>,
}

/// Runs content searches off the event loop and hands back finished results.
///
/// Starting a search cancels the one in flight; its late result still
/// arrives but carries an older generation.
pub struct ContentSearchWorker {
    active: Arc<AtomicU64>,
    result_sender: Sender<ContentSearchDone>,
    result_receiver: Receiver<ContentSearchDone>,
}

impl ContentSearchWorker {
    pub fn new() -> Self {
        let (result_sender, result_receiver) = mpsc::channel();
        Self {
            active: Arc::new(AtomicU64::new(0)),
            result_sender,
            result_receiver,
        }
    }

    pub fn start(&self, root: PathBuf, query: String, generation: u64) -> std::io::Result<()> {
        self.active.store(generation, Ordering::SeqCst);
        let token = CancelToken {
            version: generation,
            active: Arc::clone(&self.active),
        };
        let sender = self.result_sender.clone();

        thread::Builder::new()
            .name("content-search".into())
            .spawn(move || {
                info!(root = %root.display(), query = %query, generation, "content search started");
                let matches = search_content(&root, &query, &token);
                if token.is_cancelled() {
                    debug!(generation, "content search superseded");
                }
                info!(generation, matches = matches.len(), "content search finished");
                if sender
                    .send(ContentSearchDone {
                        generation,
                        query,
                        matches,
                    })
                    .is_err()
                {
                    warn!(generation, "content search result dropped, receiver gone");
                }
            })?;
        Ok(())
    }

    /// Stop whatever search is running. Generations start at 1, so 0 matches none.
    pub fn cancel(&self) {
        self.active.store(0, Ordering::SeqCst);
    }

    pub fn try_recv(&self) -> Option<ContentSearchDone> {
        match self.result_receiver.try_recv() {
            Ok(done) => Some(done),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for ContentSearchWorker {
    fn default() -> Self {
        Self::new()
    }
}
