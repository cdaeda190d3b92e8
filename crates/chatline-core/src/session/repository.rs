//! Selection repository trait.

use async_trait::async_trait;

use super::model::PersistedSelection;
use crate::error::Result;

/// Durable key-value storage for the user's selection.
///
/// Implementations only store and return what they are given; validation
/// against the backend's lists happens in [`super::SessionStore`].
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Returns the stored selection, or an empty one when nothing was saved yet.
    async fn load(&self) -> Result<PersistedSelection>;

    /// Replaces the stored selection.
    async fn save(&self, selection: PersistedSelection) -> Result<()>;

    /// Removes every stored key.
    async fn clear(&self) -> Result<()>;
}
