//! `[[wiki link]]` extraction, resolution and inline rewriting.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::files::NOTE_EXTENSION;

pub const MISSING_MARKER: &str = "missing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Text between the brackets, trimmed
    pub token: String,
    /// Where the link points, or `None` when no note matches
    pub path: Option<PathBuf>,
}

impl WikiLink {
    pub fn is_resolved(&self) -> bool {
        self.path.is_some()
    }
}

/// A well-formed `[[...]]` occurrence: its byte range in the text and the trimmed token.
struct LinkSpan<'a> {
    range: Range<usize>,
    token: &'a str,
}

/// Left-to-right scan for link spans. Pairs with an empty token or with
/// brackets inside are skipped as literal text; an unterminated `[[` ends
/// the scan.
fn link_spans(text: &str) -> impl Iterator<Item = LinkSpan<'_>> {
    let mut pos = 0;
    std::iter::from_fn(move || loop {
        let start = pos + text.get(pos..)?.find("[[")?;
        let inner_start = start + 2;
        let end = inner_start + text[inner_start..].find("]]")?;
        pos = end + 2;

        let raw = &text[inner_start..end];
        let token = raw.trim();
        if token.is_empty() || raw.contains('[') || raw.contains(']') {
            continue;
        }
        return Some(LinkSpan {
            range: start..pos,
            token,
        });
    })
}

/// Tokens of every link in `text`, de-duplicated, in first-seen order.
pub fn parse_links(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for span in link_spans(text) {
        if !tokens.iter().any(|t| t == span.token) {
            tokens.push(span.token.to_string());
        }
    }
    tokens
}

/// The file a token refers to: alias (`|`) and heading (`#`) suffixes are
/// dropped, and the note extension is added when none is given.
pub(crate) fn link_target(token: &str) -> Option<String> {
    let end = token.find(['|', '#']).unwrap_or(token.len());
    let target = token[..end].trim();
    if target.is_empty() {
        return None;
    }
    if Path::new(target).extension().is_none() {
        Some(format!("{}.{}", target, NOTE_EXTENSION))
    } else {
        Some(target.to_string())
    }
}

/// Find the note `token` names below `root`.
///
/// The walk is depth-first pre-order with entries in file-name order, and
/// stops at the first file whose name matches case-insensitively. A target
/// containing `/` is compared against the root-relative path instead.
pub fn resolve(token: &str, root: &Path) -> Option<PathBuf> {
    let wanted = link_target(token)?.to_lowercase();
    let by_path = wanted.contains('/');

    let found = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir())
        .find(|e| {
            if by_path {
                e.path()
                    .strip_prefix(root)
                    .map(|rel| rel.to_string_lossy().to_lowercase() == wanted)
                    .unwrap_or(false)
            } else {
                e.file_name().to_string_lossy().to_lowercase() == wanted
            }
        })
        .map(walkdir::DirEntry::into_path);

    debug!(token, resolved = found.is_some(), "resolved wiki link");
    found
}

pub fn resolve_all(tokens: &[String], root: &Path) -> Vec<WikiLink> {
    tokens
        .iter()
        .map(|token| WikiLink {
            token: token.clone(),
            path: resolve(token, root),
        })
        .collect()
}

/// Inline form of a link: resolved ones point at their file, unresolved ones
/// at the missing marker.
pub fn format_link(token: &str, path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("[🔗 {}]({})", token, path.display()),
        None => format!("[❓ {}]({})", token, MISSING_MARKER),
    }
}

/// Replace every well-formed `[[token]]` with its inline form. All other
/// text, malformed brackets included, is copied unchanged.
pub fn rewrite(text: &str, root: &Path) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut resolved: Vec<WikiLink> = Vec::new();

    for span in link_spans(text) {
        out.push_str(&text[last..span.range.start]);
        let path = match resolved.iter().find(|l| l.token == span.token) {
            Some(link) => link.path.clone(),
            None => {
                let path = resolve(span.token, root);
                resolved.push(WikiLink {
                    token: span.token.to_string(),
                    path: path.clone(),
                });
                path
            }
        };
        out.push_str(&format_link(span.token, path.as_deref()));
        last = span.range.end;
    }
    out.push_str(&text[last..]);
    out
}
