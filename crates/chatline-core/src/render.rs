//! Message renderer.
//!
//! A pure mapping from a [`Message`] to the fields a view displays. The only
//! non-determinism, the wall-clock fallback for a missing timestamp, is an
//! explicit argument of [`render`].

use chrono::{Local, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;

use crate::message::{Message, MessageRole};

/// Placeholder for a metric that is absent or not a number.
pub const MISSING_VALUE: &str = "-";

/// The display form of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub role: MessageRole,
    pub avatar: char,
    pub name: String,
    pub time: String,
    /// Usage line, present for agent messages only.
    pub metadata: Option<String>,
    /// Response format kind the agent answered with, when the backend says so.
    pub badge: Option<String>,
    pub text: String,
}

/// `HH:MM`, 24-hour, zero-padded.
pub fn format_time<T: Timelike>(time: &T) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Renders `message`, using `now` when the message has no timestamp.
pub fn render(message: &Message, now: NaiveTime) -> RenderedMessage {
    let role = message.role;

    let name = message
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(role.label())
        .to_string();

    let time = message
        .timestamp
        .as_deref()
        .map(str::trim)
        .filter(|ts| !ts.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format_time(&now));

    let (metadata, badge) = match role {
        MessageRole::User => (None, None),
        MessageRole::Agent => (
            Some(metadata_line(message)),
            message
                .response_format
                .as_ref()
                .map(|format| format.kind.clone())
                .filter(|kind| !kind.is_empty()),
        ),
    };

    RenderedMessage {
        role,
        avatar: role.avatar(),
        name,
        time,
        metadata,
        badge,
        text: message.text.clone(),
    }
}

/// Renders against the local wall clock.
pub fn render_now(message: &Message) -> RenderedMessage {
    render(message, Local::now().time())
}

pub fn render_all(messages: &[Message], now: NaiveTime) -> Vec<RenderedMessage> {
    messages.iter().map(|m| render(m, now)).collect()
}

/// `prompt: P | completion: C | time: T | price: X`, then the note on its own
/// line. Latency carries its `s` unit only when present: a missing latency
/// renders as a bare `time: -`.
fn metadata_line(message: &Message) -> String {
    let prompt = integer_or_missing(message.prompt_tokens);
    let completion = integer_or_missing(message.completion_tokens);
    let seconds = message
        .latency_ms
        .filter(|v| v.is_finite())
        .map(|ms| format!("{:.3}s", ms / 1000.0))
        .unwrap_or_else(|| MISSING_VALUE.to_string());
    let price = message
        .cost
        .filter(|v| v.is_finite())
        .map(|cost| format!("{cost:.7}"))
        .unwrap_or_else(|| MISSING_VALUE.to_string());

    let mut line =
        format!("prompt: {prompt} | completion: {completion} | time: {seconds} | price: {price}");

    if let Some(note) = message.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        line.push('\n');
        line.push_str(note);
    }
    line
}

fn integer_or_missing(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.avatar, self.name, self.time)?;
        if let Some(badge) = &self.badge {
            write!(f, " {badge}")?;
        }
        if let Some(metadata) = &self.metadata {
            write!(f, "\n{metadata}")?;
        }
        write!(f, "\n{}", self.text)
    }
}
