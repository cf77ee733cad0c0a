use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::info;

use super::NOTE_EXTENSION;
use crate::error::{FsError, FsResult};
use crate::links::link_target;

/// Trim `name` and reject the inputs that never make a valid single file name.
pub fn validate_name(name: &str) -> FsResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FsError::EmptyName);
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(FsError::InvalidName(name.to_string()));
    }
    Ok(name)
}

fn with_note_extension(name: &str) -> String {
    if Path::new(name).extension().is_none() {
        format!("{}.{}", name, NOTE_EXTENSION)
    } else {
        name.to_string()
    }
}

fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn write_new(path: &Path, content: &str) -> FsResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            },
            _ => FsError::io(path, e),
        })?;
    file.write_all(content.as_bytes())
        .map_err(|e| FsError::io(path, e))
}

/// Create `<name>.md` in `dir` with a title heading followed by `body`.
pub fn create_note(dir: &Path, name: &str, body: &str) -> FsResult<PathBuf> {
    let name = with_note_extension(validate_name(name)?);
    let path = dir.join(&name);
    let content = format!("# {}\n\n{}\n", title_of(&path), body.trim());
    write_new(&path, &content)?;
    info!(path = %path.display(), "created note");
    Ok(path)
}

/// Create the note a dangling wiki link points at. The token may name a
/// sub-path below `dir`, whose directories are created as needed; alias and
/// heading suffixes are not part of the file name.
pub fn create_link_note(dir: &Path, token: &str) -> FsResult<PathBuf> {
    let target = link_target(token).ok_or(FsError::EmptyName)?;
    let relative = Path::new(&target);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(FsError::InvalidName(target));
    }
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
    }
    write_new(&path, &format!("# {}\n\n", title_of(&path)))?;
    info!(path = %path.display(), "created note from wiki link");
    Ok(path)
}

pub fn create_dir(base: &Path, name: &str) -> FsResult<PathBuf> {
    let path = base.join(validate_name(name)?);
    fs::create_dir_all(&path).map_err(|e| FsError::io(&path, e))?;
    info!(path = %path.display(), "created directory");
    Ok(path)
}

/// Rename `path` within its parent directory.
pub fn rename(path: &Path, new_name: &str) -> FsResult<PathBuf> {
    let new_name = validate_name(new_name)?;
    let current = path.file_name().map(|n| n.to_string_lossy().to_string());
    if current.as_deref() == Some(new_name) {
        return Err(FsError::UnchangedName);
    }

    let target = path
        .parent()
        .map(|p| p.join(new_name))
        .unwrap_or_else(|| PathBuf::from(new_name));
    if target.exists() {
        return Err(FsError::AlreadyExists {
            name: new_name.to_string(),
        });
    }

    fs::rename(path, &target).map_err(|e| FsError::io(path, e))?;
    info!(from = %path.display(), to = %target.display(), "renamed");
    Ok(target)
}

pub fn delete(path: &Path) -> FsResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::io(path, e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| FsError::io(path, e))?;
    info!(path = %path.display(), "deleted");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    Copy,
    Cut,
}

/// A file or directory marked for a later paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClipboard {
    pub path: PathBuf,
    pub mode: ClipMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    pub path: PathBuf,
    pub message: String,
}

fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    fs::set_permissions(dst, fs::metadata(src)?.permissions())?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn copy_any(src: &Path, dst: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        copy_dir(src, dst)
    } else {
        fs::copy(src, dst).map(|_| ())
    }
}

/// Move with a copy + remove fallback for renames across devices.
fn move_any(src: &Path, dst: &Path, is_dir: bool) -> io::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    copy_any(src, dst, is_dir)?;
    if is_dir {
        fs::remove_dir_all(src)
    } else {
        fs::remove_file(src)
    }
}

/// Paste the clipboard into `dest_dir`, keeping the source's file name.
pub fn paste(clipboard: &FileClipboard, dest_dir: &Path) -> FsResult<PasteOutcome> {
    let src = &clipboard.path;
    let metadata = fs::metadata(src).map_err(|e| FsError::io(src, e))?;
    let base_name = src
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| FsError::InvalidName(src.display().to_string()))?;

    let target = dest_dir.join(&base_name);
    if target.exists() {
        return Err(FsError::AlreadyExists { name: base_name });
    }
    if metadata.is_dir() && dest_dir.starts_with(src) {
        return Err(FsError::InvalidName(format!(
            "cannot paste {} into itself",
            base_name
        )));
    }

    let (result, action) = match clipboard.mode {
        ClipMode::Copy => (copy_any(src, &target, metadata.is_dir()), "Copied"),
        ClipMode::Cut => (move_any(src, &target, metadata.is_dir()), "Moved"),
    };
    result.map_err(|e| FsError::io(&target, e))?;

    info!(from = %src.display(), to = %target.display(), action, "pasted");
    Ok(PasteOutcome {
        path: target,
        message: format!("{}: {}", action, base_name),
    })
}
