//! The in-memory transcript and its optimistic-update protocol.
//!
//! A send is applied in two phases: [`Transcript::insert_provisional`] shows the
//! user's message immediately and hands back a ticket; the ticket is then either
//! confirmed with the backend's reply ([`Transcript::confirm`]) or rolled back
//! ([`Transcript::rollback`]). At most one provisional entry exists at a time.

use chrono::NaiveTime;
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::message::Message;
use crate::render::{RenderedMessage, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Shown locally, not yet acknowledged by the backend.
    Provisional,
    Confirmed,
}

#[derive(Debug, Clone)]
struct Entry {
    message: Message,
    state: EntryState,
    ticket: Option<Uuid>,
}

/// Handle to the pending provisional entry. Consumed by confirm or rollback.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a provisional message must be confirmed or rolled back"]
pub struct ProvisionalTicket(Uuid);

/// How a confirmed reply was merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Empty reply: the provisional message was kept as confirmed.
    Confirmed,
    /// Single-message reply appended after the confirmed user message.
    Appended,
    /// Multi-message reply replaced the whole transcript.
    Replaced { len: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut transcript = Self::new();
        transcript.replace_all(messages);
        transcript
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_provisional(&self) -> bool {
        self.entries.iter().any(|e| e.state == EntryState::Provisional)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Message, EntryState)> {
        self.entries.iter().map(|e| (&e.message, e.state))
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.messages().cloned().collect()
    }

    /// Replaces every entry with server-confirmed messages.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.entries = messages
            .into_iter()
            .map(|message| Entry {
                message,
                state: EntryState::Confirmed,
                ticket: None,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Phase one: append `message` as provisional.
    pub fn insert_provisional(&mut self, message: Message) -> Result<ProvisionalTicket> {
        if self.has_provisional() {
            return Err(ChatError::internal(
                "a provisional message is already pending",
            ));
        }
        let ticket = Uuid::new_v4();
        self.entries.push(Entry {
            message,
            state: EntryState::Provisional,
            ticket: Some(ticket),
        });
        Ok(ProvisionalTicket(ticket))
    }

    /// Phase two, success: merge the backend's reply.
    ///
    /// One message is appended after the now-confirmed provisional entry. More
    /// than one is the backend's authoritative transcript and replaces
    /// everything, superseding the provisional entry.
    pub fn confirm(
        &mut self,
        ticket: ProvisionalTicket,
        mut reply: Vec<Message>,
    ) -> Result<Reconciliation> {
        let index = self.position(&ticket)?;

        if reply.len() > 1 {
            let len = reply.len();
            self.replace_all(reply);
            return Ok(Reconciliation::Replaced { len });
        }

        let entry = &mut self.entries[index];
        entry.state = EntryState::Confirmed;
        entry.ticket = None;

        match reply.pop() {
            Some(message) => {
                self.entries.push(Entry {
                    message,
                    state: EntryState::Confirmed,
                    ticket: None,
                });
                Ok(Reconciliation::Appended)
            }
            None => Ok(Reconciliation::Confirmed),
        }
    }

    /// Phase two, failure: remove the provisional entry and return it.
    pub fn rollback(&mut self, ticket: ProvisionalTicket) -> Result<Message> {
        let index = self.position(&ticket)?;
        Ok(self.entries.remove(index).message)
    }

    pub fn render(&self, now: NaiveTime) -> Vec<RenderedMessage> {
        self.messages().map(|m| render(m, now)).collect()
    }

    fn position(&self, ticket: &ProvisionalTicket) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.ticket == Some(ticket.0))
            .ok_or_else(|| ChatError::internal("unknown provisional ticket"))
    }
}
