//! REST paths per backend flavor.

use chatline_core::backend::Capabilities;
use chatline_core::config::BackendFlavor;
use reqwest::Method;

/// The path table of one backend flavor. `None` marks an operation the
/// flavor does not offer.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: &'static str,
    pub check_auth: Option<&'static str>,
    pub list_conversations: &'static str,
    pub set_conversation: &'static str,
    pub list_formats: Option<&'static str>,
    pub set_format: &'static str,
    pub message: &'static str,
    pub history: Option<&'static str>,
    /// Method of every mutating call except login and history deletion.
    pub write_method: Method,
}

impl Endpoints {
    pub fn for_flavor(flavor: BackendFlavor) -> Self {
        match flavor {
            BackendFlavor::Chats => Self {
                login: "/v1/login",
                check_auth: Some("/v1/check-auth"),
                list_conversations: "/v1/chats",
                set_conversation: "/v1/set_chat",
                list_formats: Some("/v1/response_formats"),
                set_format: "/v1/set_response_format",
                message: "/v1/message",
                history: Some("/v1/history_message"),
                write_method: Method::PUT,
            },
            BackendFlavor::AgentSystems => Self {
                list_conversations: "/v1/agent_systems",
                set_conversation: "/v1/set_agent_system",
                ..Self::for_flavor(BackendFlavor::Chats)
            },
            BackendFlavor::Legacy => Self {
                login: "/api/verify",
                check_auth: None,
                list_conversations: "/api/agents/list",
                set_conversation: "/api/model/set_new_agent",
                list_formats: None,
                set_format: "/api/model/set_response_format",
                message: "/api/question",
                history: None,
                write_method: Method::POST,
            },
        }
    }

    pub fn capabilities(&self, flavor: BackendFlavor) -> Capabilities {
        Capabilities {
            confirms_session: self.check_auth.is_some(),
            server_history: self.history.is_some(),
            history_per_conversation: flavor == BackendFlavor::Chats,
            clear_history: self.history.is_some(),
        }
    }
}
