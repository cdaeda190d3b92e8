use async_trait::async_trait;
use tokio::sync::Mutex;

use super::model::PersistedSelection;
use super::repository::SelectionRepository;
use crate::error::Result;

/// Selection repository that forgets everything when dropped.
///
/// Backs `--ephemeral` runs and tests.
#[derive(Debug, Default)]
pub struct MemorySelectionRepository {
    selection: Mutex<PersistedSelection>,
}

impl MemorySelectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: PersistedSelection) -> Self {
        Self {
            selection: Mutex::new(selection),
        }
    }

    /// Current contents, for assertions.
    pub async fn snapshot(&self) -> PersistedSelection {
        self.selection.lock().await.clone()
    }
}

#[async_trait]
impl SelectionRepository for MemorySelectionRepository {
    async fn load(&self) -> Result<PersistedSelection> {
        Ok(self.selection.lock().await.clone())
    }

    async fn save(&self, selection: PersistedSelection) -> Result<()> {
        *self.selection.lock().await = selection;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.selection.lock().await = PersistedSelection::default();
        Ok(())
    }
}
