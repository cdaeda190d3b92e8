//! The REPL view over a [`SyncController`].

use anyhow::Result;
use chatline_application::{ControllerEvent, Screen, SyncController};
use chatline_core::message::{Message, MessageRole};
use chatline_core::notification::{Notification, NotificationKind};
use chatline_core::render::{RenderedMessage, render_now};
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::command::{Command, HELP};
use crate::helper::CliHelper;

enum Input {
    Line(String),
    Interrupted,
    Eof,
}

pub struct Shell {
    controller: SyncController,
    events: UnboundedReceiver<ControllerEvent>,
    editor: Editor<CliHelper, DefaultHistory>,
    /// Messages already on screen, to print only what changed.
    shown: Vec<Message>,
}

impl Shell {
    pub fn new(
        controller: SyncController,
        events: UnboundedReceiver<ControllerEvent>,
    ) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CliHelper::new()));
        Ok(Self {
            controller,
            events,
            editor,
            shown: Vec::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "=== chatline ===".bright_magenta().bold());
        println!("{}", "Type /help for commands, 'quit' to exit.".bright_black());
        println!();

        if self.controller.resume().await {
            println!("{}", "Session resumed.".bright_green());
        }
        self.flush();

        loop {
            let keep_going = match self.controller.screen() {
                Screen::Login => self.login_step().await?,
                Screen::Chat => self.chat_step().await?,
            };
            self.flush();
            if !keep_going {
                break;
            }
        }

        println!("{}", "Goodbye!".bright_green());
        Ok(())
    }

    async fn login_step(&mut self) -> Result<bool> {
        let password = match self.read_masked("password: ")? {
            Input::Line(line) => line,
            Input::Interrupted => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                return Ok(true);
            }
            Input::Eof => return Ok(false),
        };
        if password.trim() == "quit" || password.trim() == "exit" {
            return Ok(false);
        }

        println!("{}", "Logging in...".bright_black());
        if self.controller.login(&password).await.is_err() {
            if let Some(message) = self.controller.view().auth_error {
                eprintln!("{}", format!("Error: {message}").red());
            }
        }
        Ok(true)
    }

    async fn chat_step(&mut self) -> Result<bool> {
        self.refresh_completion();
        let prompt = self.prompt();
        let line = match self.read(&prompt)? {
            Input::Line(line) => line,
            Input::Interrupted => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                return Ok(true);
            }
            Input::Eof => return Ok(false),
        };

        let Some(command) = Command::parse(&line) else {
            return Ok(true);
        };
        let _ = self.editor.add_history_entry(line.trim());

        // Outcomes surface as notifications; the results only feed the log.
        let outcome = match command {
            Command::Send(text) => match self.controller.begin_send(&text) {
                Ok(Some(pending)) => {
                    self.flush();
                    if self.controller.view().busy {
                        println!("{}", "sending...".bright_black());
                    }
                    self.controller.finish_send(pending).await
                }
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            },
            Command::Chats => {
                self.print_conversations();
                Ok(())
            }
            Command::Select(id) => self.controller.select_conversation(id.as_deref()).await,
            Command::Formats => {
                self.print_formats();
                Ok(())
            }
            Command::Format { kind, body } => {
                let result = self.controller.set_response_format(&kind, &body).await;
                if result.is_err() {
                    if let Some(message) = self.controller.view().modal_error {
                        eprintln!("{}", format!("Format: {message}").red());
                    }
                }
                result
            }
            Command::History => self.controller.reload_history().await,
            Command::Clear => {
                let confirmed = self.confirm("Delete the whole history? [y/N] ")?;
                self.controller.clear_history(confirmed).await
            }
            Command::Logout => {
                self.controller.logout().await;
                Ok(())
            }
            Command::Help => {
                println!("{}", HELP.bright_black());
                Ok(())
            }
            Command::Quit => return Ok(false),
            Command::Invalid(message) => {
                println!("{}", message.yellow());
                Ok(())
            }
        };
        if let Err(err) = outcome {
            tracing::debug!("Command failed: {}", err);
        }
        Ok(true)
    }

    fn prompt(&self) -> String {
        let view = self.controller.view();
        let target = view
            .selected_conversation
            .as_deref()
            .and_then(|id| view.conversations.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .or(view.selected_conversation)
            .unwrap_or_else(|| "no chat".to_string());
        format!("[{target}]>> ")
    }

    fn refresh_completion(&mut self) {
        let view = self.controller.view();
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_targets(
                view.conversations.into_iter().map(|c| c.id).collect(),
                view.formats,
            );
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(match self.read(question)? {
            Input::Line(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Input::Interrupted | Input::Eof => false,
        })
    }

    fn read(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn read_masked(&mut self, prompt: &str) -> Result<Input> {
        self.set_masking(true);
        let input = self.read(prompt);
        self.set_masking(false);
        input
    }

    fn set_masking(&mut self, masking: bool) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.masking = masking;
        }
    }

    fn print_conversations(&self) {
        let view = self.controller.view();
        if view.conversations.is_empty() {
            println!("{}", "No conversations.".bright_black());
        }
        for conversation in &view.conversations {
            let marker = if view.selected_conversation.as_deref() == Some(conversation.id.as_str())
            {
                "*"
            } else {
                " "
            };
            println!("{marker} {}  {}", conversation.id.bright_cyan(), conversation.name);
        }
    }

    fn print_formats(&self) {
        let view = self.controller.view();
        let current = view.current_format.map(|f| f.kind).unwrap_or_default();
        for kind in &view.formats {
            let marker = if *kind == current { "*" } else { " " };
            println!("{marker} {}", kind.bright_cyan());
        }
    }

    /// Drains controller events and redraws what changed.
    fn flush(&mut self) {
        let mut transcript_changed = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                ControllerEvent::Notify(notification) => print_notification(&notification),
                ControllerEvent::ScreenChanged(Screen::Chat) => {
                    println!("{}", "Logged in.".bright_green());
                }
                ControllerEvent::ScreenChanged(Screen::Login) => {
                    println!("{}", "Back to login.".yellow());
                }
                ControllerEvent::TranscriptChanged => transcript_changed = true,
            }
        }
        if transcript_changed {
            self.redraw_transcript();
        }
    }

    fn redraw_transcript(&mut self) {
        let current = self.controller.transcript().to_messages();
        let withdrawn = self.shown.len().saturating_sub(current.len());
        if withdrawn > 0 && self.shown[..current.len()] == current[..] {
            println!("{}", format!("({withdrawn} message(s) withdrawn)").bright_black());
            self.shown = current;
            return;
        }

        let unchanged_prefix = current.len() >= self.shown.len()
            && current[..self.shown.len()] == self.shown[..];

        let fresh = if unchanged_prefix {
            &current[self.shown.len()..]
        } else {
            if !current.is_empty() {
                println!("{}", "--- transcript ---".bright_black());
            }
            &current[..]
        };
        for message in fresh {
            print_message(&render_now(message));
        }
        self.shown = current;
    }
}

fn print_notification(notification: &Notification) {
    match notification.kind {
        NotificationKind::Success => println!("{}", notification.message.bright_green()),
        NotificationKind::Error => eprintln!("{}", notification.message.red()),
    }
}

fn print_message(rendered: &RenderedMessage) {
    let header = format!("[{}] {} {}", rendered.avatar, rendered.name, rendered.time);
    let header = match rendered.role {
        MessageRole::User => header.green(),
        MessageRole::Agent => header.bright_magenta(),
    };
    match &rendered.badge {
        Some(badge) => println!("{header} {}", badge.yellow()),
        None => println!("{header}"),
    }
    for line in rendered.text.lines() {
        match rendered.role {
            MessageRole::User => println!("  {line}"),
            MessageRole::Agent => println!("  {}", line.bright_blue()),
        }
    }
    if let Some(metadata) = &rendered.metadata {
        for line in metadata.lines() {
            println!("  {}", line.bright_black());
        }
    }
    println!();
}
