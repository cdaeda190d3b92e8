//! Transient user-visible notifications.

use serde::Serialize;
use std::time::Duration;

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A message shown for a limited time, errors longer than confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    /// An error notification prefixed with what the user was trying to do.
    pub fn failure(action: &str, err: &ChatError) -> Self {
        Self::error(format!("{action}: {}", err.user_message()))
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }

    pub fn display_duration(&self) -> Duration {
        match self.kind {
            NotificationKind::Success => Duration::from_secs(3),
            NotificationKind::Error => Duration::from_secs(5),
        }
    }
}
