//! Session domain model.

use serde::{Deserialize, Serialize};

use crate::format::ResponseFormatSpec;

/// The authenticated client session.
///
/// Created on successful login or when the backend confirms an existing
/// session at start-up, dropped on logout or on any Unauthorized response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    /// Credential used at login. Empty for a resumed session, where the
    /// backend's cookies are the only proof of authentication.
    pub credential: String,
    /// Backend-confirmed conversation selection.
    pub selected_conversation: Option<String>,
    /// Backend-confirmed response format.
    pub selected_format: ResponseFormatSpec,
}

impl Session {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            ..Self::default()
        }
    }

    pub fn resumed() -> Self {
        Self::default()
    }
}

/// The durable part of the selection, as written to storage.
///
/// Every key is optional: a fresh install has none, and each key is written
/// independently after the backend confirms the matching change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_body: Option<String>,
}

impl PersistedSelection {
    pub fn is_empty(&self) -> bool {
        self.conversation_id.is_none() && self.format_kind.is_none() && self.format_body.is_none()
    }
}
