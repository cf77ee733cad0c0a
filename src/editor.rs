use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use tracing::info;

/// Build the command for `editor` (which may carry arguments, e.g. `code --wait`) on `path`.
pub fn command(editor: &str, path: &Path) -> io::Result<Command> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no editor configured"))?;
    let mut cmd = Command::new(program);
    cmd.args(parts).arg(path);
    Ok(cmd)
}

/// Run the editor in the foreground and wait for it to exit.
/// The caller hands over the terminal before and takes it back afterwards.
pub fn edit(editor: &str, path: &Path) -> io::Result<()> {
    info!(editor, path = %path.display(), "launching editor");
    let status = command(editor, path)?.status()?;
    check_status(status)
}

fn check_status(status: ExitStatus) -> io::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("editor exited with {}", status)))
    }
}
