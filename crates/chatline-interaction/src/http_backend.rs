//! reqwest implementation of [`ChatBackend`].

use crate::endpoints::Endpoints;
use async_trait::async_trait;
use chatline_core::backend::{Capabilities, ChatBackend, LoginOutcome};
use chatline_core::config::{BackendFlavor, ClientConfig};
use chatline_core::conversation::Conversation;
use chatline_core::error::{ChatError, Result};
use chatline_core::format::ResponseFormatSpec;
use chatline_core::message::Message;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Mutex;

/// HTTP gateway to the chat backend.
///
/// The session lives in the client's cookie store, so one instance must be
/// shared for the whole session. The legacy flavor additionally resends the
/// password with every question, which is kept after a successful login.
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    flavor: BackendFlavor,
    endpoints: Endpoints,
    password: Mutex<Option<String>>,
}

impl HttpChatBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ChatError::internal(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            flavor: config.flavor,
            endpoints: Endpoints::for_flavor(config.flavor),
            password: Mutex::new(None),
        })
    }

    pub fn flavor(&self) -> BackendFlavor {
        self.flavor
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "Backend request");
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn write(&self, path: &str) -> RequestBuilder {
        self.request(self.endpoints.write_method.clone(), path)
    }

    fn stored_password(&self) -> Result<String> {
        self.password
            .lock()
            .map_err(|_| ChatError::internal("Password lock poisoned"))?
            .clone()
            .ok_or_else(|| ChatError::unauthorized("Not logged in"))
    }

    fn remember_password(&self, password: Option<String>) -> Result<()> {
        *self
            .password
            .lock()
            .map_err(|_| ChatError::internal("Password lock poisoned"))? = password;
        Ok(())
    }

    fn history_path(&self, operation: &str) -> Result<&'static str> {
        self.endpoints
            .history
            .ok_or_else(|| ChatError::unsupported(operation))
    }

    /// Adds `?id=` for flavors that address history per conversation.
    fn with_history_target(
        &self,
        request: RequestBuilder,
        conversation_id: Option<&str>,
    ) -> Result<RequestBuilder> {
        if self.flavor != BackendFlavor::Chats {
            return Ok(request);
        }
        let id = conversation_id.ok_or_else(|| ChatError::validation("Select a chat first"))?;
        Ok(request.query(&[("id", id)]))
    }
}

/// Sends the request and decodes a 2xx body as `T`.
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|err| ChatError::network(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body_text, "Backend rejected request");
        return Err(map_http_error(status, &body_text));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ChatError::network(err.to_string()))?;
    if bytes.is_empty() {
        return serde_json::from_value(Value::Null).map_err(|err| {
            ChatError::server(status.as_u16(), format!("Empty response body: {err}"))
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| {
        ChatError::server(status.as_u16(), format!("Unexpected response body: {err}"))
    })
}

/// Sends the request and treats `{"success": false}` as a rejection.
async fn execute_acknowledged(request: RequestBuilder) -> Result<Value> {
    let body: Value = execute(request).await?;
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("Request rejected by the server");
        return Err(ChatError::validation(message));
    }
    Ok(body)
}

pub(crate) fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED => {
            ChatError::unauthorized(message.unwrap_or_else(|| "Session expired".to_string()))
        }
        status if status.is_client_error() => ChatError::validation(
            message.unwrap_or_else(|| format!("Request rejected ({})", status.as_u16())),
        ),
        status => ChatError::server(
            status.as_u16(),
            message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string()
            }),
        ),
    }
}

/// Pulls the server's message out of an error body, verbatim.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    match value.get("detail").or_else(|| value.get("message")) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => Some(trimmed.to_string()),
    }
}

#[derive(Deserialize)]
struct ChatList {
    chats: Vec<Conversation>,
}

#[derive(Deserialize)]
struct SystemList {
    systems: Vec<String>,
}

#[derive(Deserialize)]
struct AgentList {
    #[serde(default)]
    agents: Vec<Conversation>,
}

#[derive(Deserialize)]
struct FormatList {
    formats: Vec<String>,
}

#[derive(Deserialize)]
struct LegacyHistory {
    #[serde(default)]
    history: Vec<Message>,
}

/// The reply shapes `/message` and `/question` are known to return.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyBody {
    List { messages: Vec<Message> },
    History { history: Vec<Message> },
    Single(Message),
}

impl ReplyBody {
    fn into_messages(self) -> Vec<Message> {
        match self {
            ReplyBody::List { messages } => messages,
            ReplyBody::History { history } => history,
            ReplyBody::Single(message) => vec![message],
        }
    }
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<Message>,
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    fn capabilities(&self) -> Capabilities {
        self.endpoints.capabilities(self.flavor)
    }

    async fn login(&self, credential: &str) -> Result<LoginOutcome> {
        let request = self
            .request(Method::POST, self.endpoints.login)
            .json(&json!({ "password": credential }));

        match self.flavor {
            BackendFlavor::Legacy => {
                let body: LegacyHistory = execute(request).await?;
                self.remember_password(Some(credential.to_string()))?;
                Ok(LoginOutcome {
                    history: Some(body.history),
                })
            }
            _ => {
                execute_acknowledged(request).await?;
                Ok(LoginOutcome::default())
            }
        }
    }

    async fn check_auth(&self) -> Result<()> {
        let path = self
            .endpoints
            .check_auth
            .ok_or_else(|| ChatError::unsupported("check_auth"))?;
        execute_acknowledged(self.request(Method::GET, path)).await?;
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let request = self.request(Method::GET, self.endpoints.list_conversations);
        match self.flavor {
            BackendFlavor::Chats => Ok(execute::<ChatList>(request).await?.chats),
            BackendFlavor::AgentSystems => Ok(execute::<SystemList>(request)
                .await?
                .systems
                .into_iter()
                .map(Conversation::from_identifier)
                .collect()),
            BackendFlavor::Legacy => {
                let body = execute_acknowledged(request).await?;
                let list: AgentList = serde_json::from_value(body).map_err(|err| {
                    ChatError::server(200, format!("Unexpected agent list: {err}"))
                })?;
                Ok(list.agents)
            }
        }
    }

    async fn set_conversation(&self, conversation_id: &str) -> Result<()> {
        let body = match self.flavor {
            BackendFlavor::Chats => json!({ "id": conversation_id }),
            BackendFlavor::AgentSystems => json!({ "system": conversation_id }),
            BackendFlavor::Legacy => json!({ "agent_key": conversation_id }),
        };
        execute_acknowledged(self.write(self.endpoints.set_conversation).json(&body)).await?;
        Ok(())
    }

    async fn list_formats(&self) -> Result<Vec<String>> {
        match self.endpoints.list_formats {
            Some(path) => Ok(execute::<FormatList>(self.request(Method::GET, path))
                .await?
                .formats),
            None => Ok(chatline_core::format::BUILTIN_FORMAT_KINDS
                .iter()
                .map(|kind| kind.to_string())
                .collect()),
        }
    }

    async fn set_format(&self, format: &ResponseFormatSpec) -> Result<()> {
        let body = match self.flavor {
            BackendFlavor::Legacy => json!({
                "response_format": { "tag": format.kind, "format": format.body }
            }),
            _ => json!({ "format_type": format.kind, "format": format.body }),
        };
        execute_acknowledged(self.write(self.endpoints.set_format).json(&body)).await?;
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<Vec<Message>> {
        let body = match self.flavor {
            BackendFlavor::Legacy => json!({
                "question": text,
                "password": self.stored_password()?,
            }),
            _ => json!({ "message": text }),
        };
        let reply: Option<ReplyBody> = execute(self.write(self.endpoints.message).json(&body)).await?;
        Ok(reply.map(ReplyBody::into_messages).unwrap_or_default())
    }

    async fn fetch_history(&self, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        let path = self.history_path("fetch_history")?;
        let request = self.with_history_target(self.request(Method::GET, path), conversation_id)?;
        Ok(execute::<MessageList>(request).await?.messages)
    }

    async fn delete_history(&self, conversation_id: Option<&str>) -> Result<()> {
        let path = self.history_path("delete_history")?;
        let request =
            self.with_history_target(self.request(Method::DELETE, path), conversation_id)?;
        execute_acknowledged(request).await?;
        Ok(())
    }
}
