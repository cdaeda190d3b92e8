//! Client configuration file storage.

use chatline_core::config::ClientConfig;
use chatline_core::error::Result;
use std::path::PathBuf;

use super::AtomicTomlFile;
use crate::paths::ChatlinePaths;

/// Loads `config.toml`, writing the defaults on first run.
///
/// Responsibilities:
/// - Resolve the default path (`~/.config/chatline/config.toml`)
/// - Materialize a default file so users have something to edit
/// - Validate the loaded values
///
/// Does NOT:
/// - Apply command-line overrides (the binary does that)
pub struct ConfigStorage {
    file: AtomicTomlFile<ClientConfig>,
}

impl ConfigStorage {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ChatlinePaths::config_file()?))
    }

    /// Creates a storage for a custom path (for testing or `--config`).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Returns the stored config, or writes and returns the defaults when the
    /// file is missing or blank.
    pub fn load_or_init(&self) -> Result<ClientConfig> {
        let config = match self.file.load()? {
            Some(config) => config,
            None => {
                let config = ClientConfig::default();
                self.file.save(&config)?;
                tracing::info!("Wrote default config to {}", self.file.path().display());
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        self.file.save(config)
    }
}
