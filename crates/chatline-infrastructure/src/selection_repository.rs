//! File-backed selection repository.
//!
//! Persists the user's conversation and response format selection to
//! `selection.toml` so it survives restarts.

use crate::paths::ChatlinePaths;
use crate::storage::AtomicTomlFile;
use chatline_core::error::{ChatError, Result};
use chatline_core::session::{PersistedSelection, SelectionRepository};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Selection repository backed by a TOML file.
///
/// The selection is read once at construction and cached; every write updates
/// the cache and then replaces the file on a blocking thread.
///
/// # Example
///
/// ```ignore
/// use chatline_infrastructure::TomlSelectionRepository;
///
/// let repository = TomlSelectionRepository::new().await?;
/// let store = SessionStore::new(Arc::new(repository));
/// store.save_conversation("c1").await?;
/// ```
#[derive(Clone)]
pub struct TomlSelectionRepository {
    /// Cached selection, guarded for concurrent readers.
    selection: Arc<Mutex<PersistedSelection>>,
    file: Arc<AtomicTomlFile<PersistedSelection>>,
}

impl TomlSelectionRepository {
    /// Opens the default `~/.config/chatline/selection.toml`.
    pub async fn new() -> Result<Self> {
        Self::with_path(ChatlinePaths::selection_file()?).await
    }

    /// Opens a repository at a custom path (for testing or `--state-file`).
    pub async fn with_path(path: PathBuf) -> Result<Self> {
        let file = Arc::new(AtomicTomlFile::new(path));

        let loader = file.clone();
        let initial = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| ChatError::internal(format!("Failed to join task: {}", e)))??
            .unwrap_or_default();

        Ok(Self {
            selection: Arc::new(Mutex::new(initial)),
            file,
        })
    }

    async fn persist(&self, selection: PersistedSelection) -> Result<()> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            if selection.is_empty() {
                file.remove()
            } else {
                file.save(&selection)
            }
        })
        .await
        .map_err(|e| ChatError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait::async_trait]
impl SelectionRepository for TomlSelectionRepository {
    async fn load(&self) -> Result<PersistedSelection> {
        Ok(self.selection.lock().await.clone())
    }

    async fn save(&self, selection: PersistedSelection) -> Result<()> {
        let mut cached = self.selection.lock().await;
        self.persist(selection.clone()).await?;
        *cached = selection;
        tracing::debug!(?cached, "Selection persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cached = self.selection.lock().await;
        self.persist(PersistedSelection::default()).await?;
        *cached = PersistedSelection::default();
        Ok(())
    }
}
