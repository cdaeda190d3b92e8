//! Response format descriptors.
//!
//! A response format is a `(kind, body)` pair telling the backend how to shape
//! its replies. The set of kinds is owned by the backend; the client only knows
//! the default sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ChatError, Result};

/// The sentinel kind meaning "no particular structure".
pub const DEFAULT_FORMAT_KIND: &str = "[DEFAULT]";

/// Kinds offered by backends that do not list them (legacy flavor).
pub const BUILTIN_FORMAT_KINDS: [&str; 3] = [DEFAULT_FORMAT_KIND, "[JSON]", "[XML]"];

/// A `(kind, body)` response format.
///
/// Invariant: `body` may be empty only when `kind` is [`DEFAULT_FORMAT_KIND`].
/// Construct through [`ResponseFormatSpec::new`] to have it checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormatSpec {
    #[serde(alias = "format_type", alias = "tag")]
    pub kind: String,
    #[serde(default, alias = "format")]
    pub body: String,
}

impl ResponseFormatSpec {
    /// Builds a validated spec. The body is trimmed first.
    pub fn new(kind: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let spec = Self {
            kind: kind.into().trim().to_string(),
            body: body.into().trim().to_string(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn is_default(&self) -> bool {
        self.kind == DEFAULT_FORMAT_KIND
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind.is_empty() {
            return Err(ChatError::validation("Select a response format"));
        }
        if self.body.is_empty() && !self.is_default() {
            return Err(ChatError::validation("Enter a format description"));
        }
        Ok(())
    }
}

impl Default for ResponseFormatSpec {
    fn default() -> Self {
        Self {
            kind: DEFAULT_FORMAT_KIND.to_string(),
            body: String::new(),
        }
    }
}

impl fmt::Display for ResponseFormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.kind, self.body)
        }
    }
}
