//! Unified path management for chatline files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chatline/          # Config directory
//! ├── config.toml              # Client configuration
//! └── selection.toml           # Persisted conversation / format selection
//!
//! ~/.local/share/chatline/     # Data directory
//! └── logs/                    # Daily rolling logs
//!     └── chatline.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

use chatline_core::error::ChatError;

const APP_DIR: &str = "chatline";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for ChatError {
    fn from(err: PathError) -> Self {
        ChatError::config(err.to_string())
    }
}

/// Resolves every chatline path from the platform's config and data dirs.
pub struct ChatlinePaths;

impl ChatlinePaths {
    /// `~/.config/chatline` on Linux, the platform equivalent elsewhere.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// `~/.local/share/chatline` on Linux, the platform equivalent elsewhere.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn selection_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("selection.toml"))
    }

    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
