use std::sync::Arc;

use super::model::PersistedSelection;
use super::repository::SelectionRepository;
use crate::conversation::{Conversation, contains_id};
use crate::error::Result;
use crate::format::ResponseFormatSpec;

/// Selection restored at bootstrap, already validated against the backend's
/// current lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoredSelection {
    pub conversation_id: Option<String>,
    pub format: Option<ResponseFormatSpec>,
}

/// Session Store: the persisted half of the user's selection.
///
/// Writes happen only after the backend confirmed the change; the store
/// itself never talks to the backend.
#[derive(Clone)]
pub struct SessionStore {
    repository: Arc<dyn SelectionRepository>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SelectionRepository>) -> Self {
        Self { repository }
    }

    /// Reads the persisted keys and keeps only those that still exist.
    ///
    /// A conversation id missing from `conversations`, or a format kind
    /// missing from `format_kinds`, is dropped silently: stale ids are
    /// expected after the backend's lists change.
    pub async fn load(
        &self,
        conversations: &[Conversation],
        format_kinds: &[String],
    ) -> Result<RestoredSelection> {
        let persisted = self.repository.load().await?;

        let conversation_id = persisted.conversation_id.filter(|id| {
            let known = contains_id(conversations, id);
            if !known {
                tracing::debug!(conversation_id = %id, "Dropping stale persisted conversation");
            }
            known
        });

        let format = match persisted.format_kind {
            Some(kind) if format_kinds.iter().any(|k| *k == kind) => {
                let body = persisted.format_body.unwrap_or_default();
                match ResponseFormatSpec::new(kind, body) {
                    Ok(spec) => Some(spec),
                    Err(err) => {
                        tracing::debug!("Dropping invalid persisted format: {}", err);
                        None
                    }
                }
            }
            Some(kind) => {
                tracing::debug!(format_kind = %kind, "Dropping stale persisted format");
                None
            }
            None => None,
        };

        Ok(RestoredSelection {
            conversation_id,
            format,
        })
    }

    pub async fn save_conversation(&self, conversation_id: &str) -> Result<()> {
        let mut selection = self.repository.load().await?;
        selection.conversation_id = Some(conversation_id.to_string());
        self.repository.save(selection).await
    }

    /// Removes only the conversation key (explicit deselection).
    pub async fn forget_conversation(&self) -> Result<()> {
        let mut selection = self.repository.load().await?;
        selection.conversation_id = None;
        self.repository.save(selection).await
    }

    /// Writes kind and body in a single save.
    pub async fn save_format(&self, format: &ResponseFormatSpec) -> Result<()> {
        let mut selection = self.repository.load().await?;
        selection.format_kind = Some(format.kind.clone());
        selection.format_body = Some(format.body.clone());
        self.repository.save(selection).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.repository.clear().await
    }

    pub async fn persisted(&self) -> Result<PersistedSelection> {
        self.repository.load().await
    }
}
