use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::browser::{ExtensionFilter, Filters, SortMode};
use crate::error::ConfigError;

const APP_DIR: &str = "notesmd";
const DEFAULT_EDITOR: &str = "nvim";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub md_only: bool,
    pub show_hidden: bool,
    pub sort_mode: SortMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            md_only: false,
            show_hidden: false,
            sort_mode: SortMode::Name,
        }
    }
}

impl FilterConfig {
    pub fn to_filters(&self) -> Filters {
        Filters {
            show_hidden: self.show_hidden,
            extension: if self.md_only {
                ExtensionFilter::Markdown
            } else {
                ExtensionFilter::All
            },
            sort: self.sort_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_recent_files: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_recent_files: 10,
        }
    }
}

/// User settings, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command used to edit notes; falls back to `$EDITOR`, then `nvim`
    pub editor: Option<String>,
    pub theme: usize,
    pub default_dir: Option<String>,
    pub filters: FilterConfig,
    pub search: SearchConfig,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(env::var("HOME").unwrap_or_default()).join(".config"))
            .join(APP_DIR)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load the config file, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default config");
                Self::default()
            }
        }
    }

    /// A missing file is not an error: it yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
    }

    /// The configured default directory with `~` expanded.
    pub fn default_dir(&self) -> Option<PathBuf> {
        self.default_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(shellexpand::tilde(d).to_string()))
    }
}

/// What survives between runs, kept in `state.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub last_directory: Option<PathBuf>,
    pub last_theme: Option<usize>,
    pub recent_files: Vec<PathBuf>,
    pub bookmarks: Vec<PathBuf>,
}

impl SessionState {
    pub fn state_path() -> PathBuf {
        Config::config_dir().join("state.toml")
    }

    pub fn load() -> Self {
        let path = Self::state_path();
        match Self::load_from(&path) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring saved session");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::state_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "saved session");
        Ok(())
    }

    /// Theme to start with: the saved one if it still exists, else the configured one.
    pub fn theme_index(&self, config: &Config, theme_count: usize) -> usize {
        match self.last_theme {
            Some(theme) if theme < theme_count => theme,
            _ if config.theme < theme_count => config.theme,
            _ => 0,
        }
    }
}

/// Start directory: the command-line path, then the last directory of the
/// previous session, then the configured default, then the working directory.
pub fn start_directory(arg: Option<PathBuf>, state: &SessionState, config: &Config) -> PathBuf {
    arg.or_else(|| state.last_directory.clone().filter(|d| d.is_dir()))
        .or_else(|| config.default_dir().filter(|d| d.is_dir()))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.max_recent_files, 10);

        let state = SessionState::load_from(&dir.path().join("state.toml")).unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_partial_config_is_filled_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "editor = \"hx\"\n\n[filters]\nmd_only = true\nsort_mode = \"modified\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.editor_command(), "hx");
        assert_eq!(config.search.max_recent_files, 10);

        let filters = config.filters.to_filters();
        assert_eq!(filters.extension, ExtensionFilter::Markdown);
        assert_eq!(filters.sort, SortMode::Modified);
        assert!(!filters.show_hidden);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[filters]\nsort_mode = \"random\"\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_state_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state.toml");
        let state = SessionState {
            last_directory: Some(PathBuf::from("/notes/journal")),
            last_theme: Some(2),
            recent_files: vec![PathBuf::from("/notes/a.md")],
            bookmarks: vec![PathBuf::from("/notes/b.md")],
        };
        state.save_to(&path).unwrap();
        assert_eq!(SessionState::load_from(&path).unwrap(), state);
    }

    #[test]
    fn test_theme_selection() {
        let config = Config {
            theme: 1,
            ..Config::default()
        };
        let saved = SessionState {
            last_theme: Some(3),
            ..SessionState::default()
        };
        assert_eq!(saved.theme_index(&config, 5), 3);
        assert_eq!(saved.theme_index(&config, 3), 1);
        assert_eq!(SessionState::default().theme_index(&config, 1), 0);
    }

    #[test]
    fn test_start_directory_precedence() {
        let dir = TempDir::new().unwrap();
        let last = dir.path().join("last");
        let default = dir.path().join("default");
        fs::create_dir_all(&last).unwrap();
        fs::create_dir_all(&default).unwrap();

        let config = Config {
            default_dir: Some(default.display().to_string()),
            ..Config::default()
        };
        let state = SessionState {
            last_directory: Some(last.clone()),
            ..SessionState::default()
        };

        let arg = dir.path().join("arg");
        assert_eq!(start_directory(Some(arg.clone()), &state, &config), arg);
        assert_eq!(start_directory(None, &state, &config), last);
        assert_eq!(start_directory(None, &SessionState::default(), &config), default);

        let gone = SessionState {
            last_directory: Some(dir.path().join("gone")),
            ..SessionState::default()
        };
        assert_eq!(start_directory(None, &gone, &config), default);
    }

    #[test]
    fn test_default_dir_expands_tilde() {
        let config = Config {
            default_dir: Some("~/notes".into()),
            ..Config::default()
        };
        let expanded = config.default_dir().unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("notes"));
    }
}
