//! What the controller tells the view.

use chatline_core::conversation::Conversation;
use chatline_core::format::ResponseFormatSpec;
use chatline_core::notification::Notification;
use serde::Serialize;

/// Authentication lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    LoggedOut,
    /// A login request or its confirmation probe is in flight.
    Authenticating,
    Ready,
}

/// The screen the view should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    Chat,
}

impl From<ConnectionState> for Screen {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Ready => Screen::Chat,
            ConnectionState::LoggedOut | ConnectionState::Authenticating => Screen::Login,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Notify(Notification),
    ScreenChanged(Screen),
    /// The transcript was mutated; re-render it.
    TranscriptChanged,
}

/// Snapshot of everything the view presents besides the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub screen: Screen,
    pub conversations: Vec<Conversation>,
    pub formats: Vec<String>,
    /// What the conversation selector shows. Equal to `selected_conversation`
    /// except while a selection request is in flight.
    pub presented_conversation: Option<String>,
    pub selected_conversation: Option<String>,
    pub current_format: Option<ResponseFormatSpec>,
    /// Input is disabled while a message is in flight.
    pub busy: bool,
    pub auth_error: Option<String>,
    pub modal_error: Option<String>,
}
