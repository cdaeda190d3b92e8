//! Message record exchanged with the backend.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::format::ResponseFormatSpec;

/// Who authored a message.
///
/// The backend tags messages `USER`, `AI` or `SYSTEM`; older backends used
/// lower-case chat roles. Everything that is not the user renders as an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "USER", alias = "user")]
    User,
    #[serde(
        rename = "AI",
        alias = "AGENT",
        alias = "SYSTEM",
        alias = "ai",
        alias = "agent",
        alias = "assistant",
        alias = "system"
    )]
    Agent,
}

impl MessageRole {
    /// Fixed label, also the fallback display name.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "You",
            MessageRole::Agent => "Agent",
        }
    }

    /// Avatar glyph. The two roles never share one.
    pub fn avatar(&self) -> char {
        match self {
            MessageRole::User => 'U',
            MessageRole::Agent => 'A',
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, MessageRole::User)
    }
}

/// A single transcript entry.
///
/// Numeric usage metrics are optional and tolerate garbage: a value that is
/// not a JSON number deserializes as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "chat_id", default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "message_type", alias = "role")]
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "message", alias = "content", default)]
    pub text: String,
    #[serde(alias = "time", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<i64>,
    #[serde(
        rename = "request_time",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub latency_ms: Option<f64>,
    #[serde(
        rename = "price",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost: Option<f64>,
    #[serde(rename = "meta", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "response_format",
        alias = "responseFormat",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_format: Option<ResponseFormatSpec>,
}

impl Message {
    /// A bare message with every optional field unset.
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: None,
            conversation_id: None,
            session_id: None,
            role,
            agent_id: None,
            display_name: None,
            text: text.into(),
            timestamp: None,
            prompt_tokens: None,
            completion_tokens: None,
            latency_ms: None,
            cost: None,
            note: None,
            response_format: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Agent, text)
    }

    /// The client-side stand-in for a message the user just submitted.
    ///
    /// Only the text travels to the backend; role, name, timestamp and the
    /// conversation id exist for display until the server's record replaces it.
    pub fn provisional_user<Tz: TimeZone>(
        text: impl Into<String>,
        conversation_id: Option<String>,
        now: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            conversation_id,
            display_name: Some(MessageRole::User.label().to_string()),
            timestamp: Some(now.format("%H:%M:%S").to_string()),
            ..Self::user(text)
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
