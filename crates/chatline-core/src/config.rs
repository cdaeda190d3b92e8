use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ChatError;

/// Which generation of the backend REST surface the client talks to.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendFlavor {
    /// `/v1/*` with selectable chats and per-chat history.
    #[default]
    Chats,
    /// `/v1/*` with selectable agent systems and one global history.
    AgentSystems,
    /// `/api/*` with selectable agents; no session probe, no history endpoints.
    Legacy,
}

impl BackendFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendFlavor::Chats => "chats",
            BackendFlavor::AgentSystems => "agent_systems",
            BackendFlavor::Legacy => "legacy",
        }
    }
}

impl fmt::Display for BackendFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendFlavor {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "chats" => Ok(BackendFlavor::Chats),
            "agent_systems" => Ok(BackendFlavor::AgentSystems),
            "legacy" => Ok(BackendFlavor::Legacy),
            other => Err(ChatError::config(format!(
                "unknown backend flavor '{other}' (expected chats, agent_systems or legacy)"
            ))),
        }
    }
}

/// Client configuration stored in `config.toml`.
///
/// Every field has a default so a partial or empty file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, without a trailing path (e.g. `http://127.0.0.1:8000`).
    pub base_url: String,
    pub flavor: BackendFlavor,
    /// Wait before the first session probe after login. Cookie propagation on
    /// the backend lags behind the login response.
    pub confirm_delay_ms: u64,
    /// Number of session probes before login is declared unconfirmed.
    pub confirm_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            flavor: BackendFlavor::default(),
            confirm_delay_ms: 100,
            confirm_attempts: 3,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks the values that would otherwise only fail at request time.
    pub fn validate(&self) -> Result<(), ChatError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ChatError::config(format!(
                "base_url must start with http:// or https://, got '{base}'"
            )));
        }
        if self.confirm_attempts == 0 {
            return Err(ChatError::config("confirm_attempts must be at least 1"));
        }
        Ok(())
    }
}
