/// Slash commands offered for completion.
pub const COMMANDS: [&str; 9] = [
    "/chats", "/select", "/formats", "/format", "/history", "/clear", "/logout", "/help", "/quit",
];

/// One line of input on the chat screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Chats,
    /// `None` deselects (`/select -`).
    Select(Option<String>),
    Formats,
    Format { kind: String, body: String },
    History,
    Clear,
    Logout,
    Help,
    Quit,
    /// Malformed input with the message to show.
    Invalid(String),
}

impl Command {
    /// Parses a chat-screen line. Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line == "quit" || line == "exit" {
            return Some(Command::Quit);
        }
        if !line.starts_with('/') {
            return Some(Command::Send(line.to_string()));
        }

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((line, ""));

        let command = match name {
            "/chats" => Command::Chats,
            "/select" => match rest {
                "" => Command::Invalid("Usage: /select <id> (or /select - to deselect)".into()),
                "-" => Command::Select(None),
                id => Command::Select(Some(id.to_string())),
            },
            "/formats" => Command::Formats,
            "/format" => {
                let (kind, body) = rest
                    .split_once(char::is_whitespace)
                    .unwrap_or((rest, ""));
                if kind.is_empty() {
                    Command::Invalid("Usage: /format <kind> [description]".into())
                } else {
                    Command::Format {
                        kind: kind.to_string(),
                        body: body.trim().to_string(),
                    }
                }
            }
            "/history" => Command::History,
            "/clear" => Command::Clear,
            "/logout" => Command::Logout,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Invalid(format!("Unknown command: {other} (try /help)")),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
  <text>                 send a message
  /chats                 list conversations
  /select <id>           select a conversation (/select - to deselect)
  /formats               list response formats
  /format <kind> [desc]  set the response format
  /history               reload the history
  /clear                 delete the history
  /logout                log out
  quit | exit            leave";
