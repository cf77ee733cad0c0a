use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type FsResult<T> = Result<T, FsError>;

/// Failures of the file operations the browser can trigger.
///
/// None of these ever stop the session: they are turned into a status
/// message and the current view stays where it was.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("already exists: {name}")]
    AlreadyExists { name: String },
    #[error("name cannot be empty")]
    EmptyName,
    #[error("name is unchanged")]
    UnchangedName,
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("clipboard is empty")]
    EmptyClipboard,
}

impl FsError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = FsError::io("/tmp/missing.md", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("/tmp/missing.md: "));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(FsError::EmptyName.to_string(), "name cannot be empty");
        assert_eq!(
            FsError::AlreadyExists { name: "a.md".into() }.to_string(),
            "already exists: a.md"
        );
    }
}
