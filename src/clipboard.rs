//! System clipboard access for copying paths and note contents.

use arboard::Clipboard;
use thiserror::Error;

pub type ClipboardResult<T> = Result<T, ClipboardError>;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to open clipboard: {0}")]
    ContextCreation(String),
    #[error("failed to write clipboard: {0}")]
    Write(String),
}

/// Owns the clipboard handle for the lifetime of the UI. Some platforms drop
/// the contents when the handle that set them goes away, so it is kept open.
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }

    fn handle(&mut self) -> ClipboardResult<&mut Clipboard> {
        if self.inner.is_none() {
            let clipboard =
                Clipboard::new().map_err(|e| ClipboardError::ContextCreation(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::ContextCreation("clipboard unavailable".into()))
    }

    pub fn set_text(&mut self, text: String) -> ClipboardResult<()> {
        self.handle()?
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}
