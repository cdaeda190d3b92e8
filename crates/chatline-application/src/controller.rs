//! Synchronization controller.
//!
//! `SyncController` owns the client-side view of one chat session: the
//! authentication state, the conversation and format lists, the current
//! selection and the transcript. Every user action goes through one of its
//! methods, which talk to the backend and then update local state so that it
//! never runs ahead of what the backend confirmed (the optimistic send being
//! the one exception, and it is rolled back on failure).
//!
//! Mutating methods take `&mut self`, so actions on one controller are
//! strictly sequential. Notifications and redraw hints are pushed to the
//! receiver returned by [`SyncController::new`].

use crate::event::{ConnectionState, ControllerEvent, Screen, ViewState};
use chatline_core::backend::{Capabilities, ChatBackend};
use chatline_core::config::ClientConfig;
use chatline_core::conversation::{Conversation, contains_id};
use chatline_core::error::{ChatError, Result};
use chatline_core::format::ResponseFormatSpec;
use chatline_core::message::Message;
use chatline_core::notification::Notification;
use chatline_core::session::{Session, SessionStore};
use chatline_core::transcript::{ProvisionalTicket, Transcript};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const SESSION_EXPIRED: &str = "Session expired, please log in again";

/// A message inserted provisionally whose request has not been sent yet.
#[must_use]
#[derive(Debug)]
pub struct PendingSend {
    ticket: ProvisionalTicket,
    text: String,
}

pub struct SyncController {
    backend: Arc<dyn ChatBackend>,
    store: SessionStore,
    events: UnboundedSender<ControllerEvent>,
    confirm_delay: Duration,
    confirm_attempts: u32,

    state: ConnectionState,
    session: Option<Session>,
    transcript: Transcript,
    conversations: Vec<Conversation>,
    formats: Vec<String>,
    presented_conversation: Option<String>,
    busy: bool,
    auth_error: Option<String>,
    modal_error: Option<String>,
}

impl SyncController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: SessionStore,
        config: &ClientConfig,
    ) -> (Self, UnboundedReceiver<ControllerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            store,
            events,
            confirm_delay: config.confirm_delay(),
            confirm_attempts: config.confirm_attempts.max(1),
            state: ConnectionState::LoggedOut,
            session: None,
            transcript: Transcript::new(),
            conversations: Vec::new(),
            formats: Vec::new(),
            presented_conversation: None,
            busy: false,
            auth_error: None,
            modal_error: None,
        };
        (controller, receiver)
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.into()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn selected_conversation(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.selected_conversation.as_deref())
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            screen: self.screen(),
            conversations: self.conversations.clone(),
            formats: self.formats.clone(),
            presented_conversation: self.presented_conversation.clone(),
            selected_conversation: self.selected_conversation().map(str::to_string),
            current_format: self
                .session
                .as_ref()
                .map(|session| session.selected_format.clone()),
            busy: self.busy,
            auth_error: self.auth_error.clone(),
            modal_error: self.modal_error.clone(),
        }
    }

    // ============================================================================
    // Authentication
    // ============================================================================

    /// Logs in with `credential` and bootstraps the chat screen.
    ///
    /// Failures land in `auth_error` and leave the controller logged out.
    pub async fn login(&mut self, credential: &str) -> Result<()> {
        if self.state != ConnectionState::LoggedOut {
            return Err(ChatError::internal("Already logged in"));
        }

        let credential = credential.trim();
        if credential.is_empty() {
            let err = ChatError::validation("Enter a password");
            self.auth_error = Some(err.user_message());
            return Err(err);
        }

        self.state = ConnectionState::Authenticating;
        self.auth_error = None;
        tracing::info!("Logging in");

        let outcome = match self.backend.login(credential).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.login_failed(err)),
        };

        if self.capabilities().confirms_session {
            if let Err(err) = self.confirm_session().await {
                return Err(self.login_failed(err));
            }
        }

        self.enter_ready(Session::new(credential));
        if let Some(history) = outcome.history {
            self.transcript.replace_all(history);
            self.emit(ControllerEvent::TranscriptChanged);
        }
        self.bootstrap().await;
        Ok(())
    }

    /// Probes for a session that survived a restart.
    ///
    /// Returns true when the backend still considers the client logged in.
    /// An unauthorized probe is the normal logged-out case and is not reported.
    pub async fn resume(&mut self) -> bool {
        if self.state != ConnectionState::LoggedOut || !self.capabilities().confirms_session {
            return false;
        }

        match self.backend.check_auth().await {
            Ok(()) => {
                tracing::info!("Resuming existing session");
                self.enter_ready(Session::resumed());
                self.bootstrap().await;
                self.state == ConnectionState::Ready
            }
            Err(err) => {
                tracing::debug!("No session to resume: {}", err);
                false
            }
        }
    }

    /// Local logout: forgets the session and the persisted selection.
    pub async fn logout(&mut self) {
        tracing::info!("Logging out");
        self.reset().await;
        self.auth_error = None;
        self.notify(Notification::success("Logged out"));
    }

    async fn confirm_session(&self) -> Result<()> {
        for attempt in 1..=self.confirm_attempts {
            tokio::time::sleep(self.confirm_delay).await;
            match self.backend.check_auth().await {
                Ok(()) => {
                    tracing::debug!(attempt, "Session confirmed");
                    return Ok(());
                }
                Err(err) if err.is_unauthorized() => {
                    tracing::debug!(attempt, "Session not yet confirmed");
                }
                Err(err) => return Err(err),
            }
        }
        Err(ChatError::SessionNotConfirmed(
            "The server accepted the password but did not confirm the session".to_string(),
        ))
    }

    fn login_failed(&mut self, err: ChatError) -> ChatError {
        tracing::warn!("Login failed: {}", err);
        self.state = ConnectionState::LoggedOut;
        self.auth_error = Some(err.user_message());
        err
    }

    fn enter_ready(&mut self, session: Session) {
        self.state = ConnectionState::Ready;
        self.session = Some(session);
        self.auth_error = None;
        self.emit(ControllerEvent::ScreenChanged(Screen::Chat));
    }

    /// Loads lists, restores the persisted selection and the history.
    ///
    /// Each failing step is reported and skipped; only Unauthorized stops it.
    async fn bootstrap(&mut self) {
        match self.backend.list_conversations().await {
            Ok(conversations) => self.conversations = conversations,
            Err(err) => {
                if !self.step_failed("Failed to load conversations", err).await {
                    return;
                }
            }
        }

        match self.backend.list_formats().await {
            Ok(formats) => self.formats = formats,
            Err(err) => {
                if !self.step_failed("Failed to load response formats", err).await {
                    return;
                }
            }
        }

        match self.store.load(&self.conversations, &self.formats).await {
            Ok(restored) => {
                if let Some(session) = self.session.as_mut() {
                    session.selected_conversation = restored.conversation_id.clone();
                    if let Some(format) = restored.format {
                        session.selected_format = format;
                    }
                }
                self.presented_conversation = restored.conversation_id;
            }
            Err(err) => {
                tracing::warn!("Failed to restore selection: {}", err);
                self.notify(Notification::failure("Failed to restore selection", &err));
            }
        }

        if let Some(target) = self.history_target() {
            match self.backend.fetch_history(target.as_deref()).await {
                Ok(history) => {
                    self.transcript.replace_all(history);
                    self.emit(ControllerEvent::TranscriptChanged);
                }
                Err(err) => {
                    self.step_failed("Failed to load history", err).await;
                }
            }
        }

        tracing::info!(
            conversations = self.conversations.len(),
            formats = self.formats.len(),
            messages = self.transcript.len(),
            "Bootstrap finished"
        );
    }

    // ============================================================================
    // Conversation selection and history
    // ============================================================================

    /// Selects a conversation, or deselects with `None`.
    ///
    /// The backend must accept the change before anything local moves. On
    /// failure the presented selector falls back to the previous selection.
    pub async fn select_conversation(&mut self, conversation_id: Option<&str>) -> Result<()> {
        self.ensure_ready()?;
        let previous = self.selected_conversation().map(str::to_string);

        let Some(id) = conversation_id.map(str::trim).filter(|id| !id.is_empty()) else {
            self.set_selected(None);
            self.presented_conversation = None;
            if let Err(err) = self.store.forget_conversation().await {
                tracing::warn!("Failed to forget conversation: {}", err);
            }
            return Ok(());
        };

        if !self.conversations.is_empty() && !contains_id(&self.conversations, id) {
            let err = ChatError::validation(format!("Unknown conversation: {id}"));
            self.notify(Notification::failure("Failed to select conversation", &err));
            return Err(err);
        }

        self.presented_conversation = Some(id.to_string());
        if let Err(err) = self.backend.set_conversation(id).await {
            tracing::warn!(conversation_id = %id, "Selection rejected: {}", err);
            self.presented_conversation = previous;
            return Err(self.report("Failed to select conversation", err).await);
        }

        self.set_selected(Some(id.to_string()));
        if let Err(err) = self.store.save_conversation(id).await {
            tracing::warn!("Failed to persist conversation: {}", err);
        }
        tracing::info!(conversation_id = %id, "Conversation selected");

        if self.capabilities().server_history {
            if let Err(err) = self.reload_history().await {
                // The old conversation's messages must not show under the new one.
                if self.state == ConnectionState::Ready {
                    self.transcript.clear();
                    self.emit(ControllerEvent::TranscriptChanged);
                }
                return Err(err);
            }
        }

        let name = self
            .conversations
            .iter()
            .find(|conversation| conversation.id == id)
            .map_or(id, |conversation| conversation.name.as_str());
        self.notify(Notification::success(format!("Chat \"{name}\" selected")));
        Ok(())
    }

    /// Replaces the transcript with the backend's history.
    pub async fn reload_history(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let Some(target) = self.history_target() else {
            return Err(ChatError::validation("Select a chat first"));
        };

        match self.backend.fetch_history(target.as_deref()).await {
            Ok(history) => {
                tracing::debug!(messages = history.len(), "History reloaded");
                self.transcript.replace_all(history);
                self.emit(ControllerEvent::TranscriptChanged);
                Ok(())
            }
            Err(err) => Err(self.report("Failed to load history", err).await),
        }
    }

    /// Purges the history. `confirmed` is the user's answer to the prompt;
    /// a declined prompt does nothing.
    pub async fn clear_history(&mut self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Ok(());
        }
        self.ensure_ready()?;

        let target = if self.capabilities().clear_history {
            self.history_target()
                .ok_or_else(|| ChatError::validation("Select a chat first"))
        } else {
            Err(ChatError::unsupported("clear_history"))
        };
        let target = match target {
            Ok(target) => target,
            Err(err) => {
                self.notify(Notification::failure("Failed to clear history", &err));
                return Err(err);
            }
        };

        match self.backend.delete_history(target.as_deref()).await {
            Ok(()) => {
                tracing::info!("History cleared");
                self.transcript.clear();
                self.emit(ControllerEvent::TranscriptChanged);
                self.notify(Notification::success("History cleared"));
                Ok(())
            }
            Err(err) => Err(self.report("Failed to clear history", err).await),
        }
    }

    // ============================================================================
    // Messaging
    // ============================================================================

    /// Sends `text` with an optimistic update of the transcript.
    ///
    /// Blank text is ignored. Equivalent to [`Self::begin_send`] followed by
    /// [`Self::finish_send`]; views that redraw while the request is in flight
    /// call the two halves themselves.
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        match self.begin_send(text)? {
            Some(pending) => self.finish_send(pending).await,
            None => Ok(()),
        }
    }

    /// Inserts the user's message as provisional and marks the controller busy.
    ///
    /// Returns `None` for blank text. The returned [`PendingSend`] must be
    /// passed to [`Self::finish_send`].
    pub fn begin_send(&mut self, text: &str) -> Result<Option<PendingSend>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.ensure_ready()?;
        if self.busy {
            return Err(ChatError::internal("A message is already in flight"));
        }

        let provisional = Message::provisional_user(
            text,
            self.selected_conversation().map(str::to_string),
            &chrono::Local::now(),
        );
        let ticket = self.transcript.insert_provisional(provisional)?;
        self.busy = true;
        self.emit(ControllerEvent::TranscriptChanged);

        Ok(Some(PendingSend {
            ticket,
            text: text.to_string(),
        }))
    }

    /// Sends a begun message and reconciles the transcript with the reply,
    /// or removes the provisional message on failure.
    pub async fn finish_send(&mut self, pending: PendingSend) -> Result<()> {
        let PendingSend { ticket, text } = pending;
        let result = self.backend.send_message(&text).await;
        self.busy = false;

        match result {
            Ok(reply) => {
                let reconciliation = self.transcript.confirm(ticket, reply)?;
                tracing::debug!(?reconciliation, "Message delivered");
                self.emit(ControllerEvent::TranscriptChanged);
                Ok(())
            }
            Err(err) => {
                self.transcript.rollback(ticket)?;
                tracing::error!("Message rolled back: {}", err);
                self.emit(ControllerEvent::TranscriptChanged);
                Err(self.report("Failed to send message", err).await)
            }
        }
    }

    // ============================================================================
    // Response format
    // ============================================================================

    /// Applies a response format. Errors only touch `modal_error`.
    pub async fn set_response_format(&mut self, kind: &str, body: &str) -> Result<()> {
        self.ensure_ready()?;

        let format = match ResponseFormatSpec::new(kind, body) {
            Ok(format) => format,
            Err(err) => return Err(self.modal_failed(err)),
        };
        if !self.formats.is_empty() && !self.formats.contains(&format.kind) {
            let err = ChatError::validation(format!("Unknown response format: {}", format.kind));
            return Err(self.modal_failed(err));
        }

        if let Err(err) = self.backend.set_format(&format).await {
            let err = self.modal_failed(err);
            if err.is_unauthorized() {
                self.expire().await;
            }
            return Err(err);
        }

        if let Err(err) = self.store.save_format(&format).await {
            tracing::warn!("Failed to persist response format: {}", err);
        }
        tracing::info!(kind = %format.kind, "Response format applied");
        self.modal_error = None;
        self.notify(Notification::success(format!(
            "Response format set to {}",
            format.kind
        )));
        if let Some(session) = self.session.as_mut() {
            session.selected_format = format;
        }
        Ok(())
    }

    fn modal_failed(&mut self, err: ChatError) -> ChatError {
        tracing::warn!("Response format rejected: {}", err);
        self.modal_error = Some(err.user_message());
        err
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            ConnectionState::Ready => Ok(()),
            _ => Err(ChatError::unauthorized("Not logged in")),
        }
    }

    fn set_selected(&mut self, conversation_id: Option<String>) {
        if let Some(session) = self.session.as_mut() {
            session.selected_conversation = conversation_id;
        }
    }

    /// Which history to address: `Some(None)` for global history,
    /// `Some(Some(id))` per conversation, `None` when there is nothing to load.
    fn history_target(&self) -> Option<Option<String>> {
        let capabilities = self.capabilities();
        if !capabilities.server_history {
            return None;
        }
        if capabilities.history_per_conversation {
            self.selected_conversation().map(|id| Some(id.to_string()))
        } else {
            Some(None)
        }
    }

    /// Reports a failed bootstrap step. Returns false when bootstrap must stop.
    async fn step_failed(&mut self, action: &str, err: ChatError) -> bool {
        let stop = err.is_unauthorized();
        tracing::warn!("{}: {}", action, err);
        self.report(action, err).await;
        !stop
    }

    /// Notifies about a failed action and expires the session on Unauthorized.
    async fn report(&mut self, action: &str, err: ChatError) -> ChatError {
        if err.is_unauthorized() {
            self.expire().await;
        } else {
            self.notify(Notification::failure(action, &err));
        }
        err
    }

    async fn expire(&mut self) {
        tracing::info!("Session expired");
        self.reset().await;
        self.auth_error = Some(SESSION_EXPIRED.to_string());
        self.notify(Notification::error(SESSION_EXPIRED));
    }

    async fn reset(&mut self) {
        let was_ready = self.state == ConnectionState::Ready;
        self.state = ConnectionState::LoggedOut;
        self.session = None;
        self.transcript.clear();
        self.conversations.clear();
        self.formats.clear();
        self.presented_conversation = None;
        self.busy = false;
        self.modal_error = None;

        if let Err(err) = self.store.clear().await {
            tracing::warn!("Failed to clear persisted selection: {}", err);
        }
        self.emit(ControllerEvent::TranscriptChanged);
        if was_ready {
            self.emit(ControllerEvent::ScreenChanged(Screen::Login));
        }
    }

    fn notify(&self, notification: Notification) {
        self.emit(ControllerEvent::Notify(notification));
    }

    fn emit(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}
