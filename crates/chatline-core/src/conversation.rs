//! Selectable conversation targets (chats, agent systems, agents).

use serde::{Deserialize, Serialize};

/// A named target the user can select. Switching it reloads the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
}

impl Conversation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Targets the backend lists as bare identifiers use the id as the name.
    pub fn from_identifier(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }
}

/// Returns true when `id` names one of `conversations`.
pub fn contains_id(conversations: &[Conversation], id: &str) -> bool {
    conversations.iter().any(|c| c.id == id)
}
