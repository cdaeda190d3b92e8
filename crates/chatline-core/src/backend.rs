//! Backend gateway trait.
//!
//! `chatline-interaction` provides the HTTP implementation; the controller only
//! sees this trait, which keeps it testable against a scripted backend.

use async_trait::async_trait;

use crate::conversation::Conversation;
use crate::error::Result;
use crate::format::ResponseFormatSpec;
use crate::message::Message;

/// Which optional steps the backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// A session probe exists and login must be confirmed through it.
    pub confirms_session: bool,
    /// History can be fetched independently of login and sends.
    pub server_history: bool,
    /// History is addressed by conversation id rather than being global.
    pub history_per_conversation: bool,
    /// History can be purged.
    pub clear_history: bool,
}

/// What a successful login returned besides the session itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginOutcome {
    /// Initial transcript, for backends that hand it out at login.
    pub history: Option<Vec<Message>>,
}

/// Typed client for the backend REST surface.
///
/// Every method receives validated, already-trimmed input and fails with one
/// of `Unauthorized`, `Validation`, `Server` or `Network`
/// (see [`crate::ChatError`]); `Unsupported` is returned for operations the
/// backend flavor lacks.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Submits the credential and starts a session.
    async fn login(&self, credential: &str) -> Result<LoginOutcome>;

    /// Succeeds when the backend considers the current session authenticated.
    async fn check_auth(&self) -> Result<()>;

    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    async fn set_conversation(&self, conversation_id: &str) -> Result<()>;

    /// Lists the selectable response format kinds.
    async fn list_formats(&self) -> Result<Vec<String>>;

    async fn set_format(&self, format: &ResponseFormatSpec) -> Result<()>;

    /// Sends the raw user text and returns the reply messages.
    ///
    /// One message is a reply to append; more than one is the backend's full
    /// view of the transcript.
    async fn send_message(&self, text: &str) -> Result<Vec<Message>>;

    async fn fetch_history(&self, conversation_id: Option<&str>) -> Result<Vec<Message>>;

    async fn delete_history(&self, conversation_id: Option<&str>) -> Result<()>;
}
