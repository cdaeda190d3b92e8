use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMANDS;

/// rustyline helper: command completion, hints and password masking.
#[derive(Clone, Default)]
pub struct CliHelper {
    /// Completion candidates for `/select`.
    conversation_ids: Vec<String>,
    /// Completion candidates for `/format`.
    format_kinds: Vec<String>,
    /// Hide the line while a password is typed.
    pub masking: bool,
}

impl CliHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_targets(&mut self, conversation_ids: Vec<String>, format_kinds: Vec<String>) {
        self.conversation_ids = conversation_ids;
        self.format_kinds = format_kinds;
    }

    fn argument_candidates(&self, command: &str) -> &[String] {
        match command {
            "/select" => &self.conversation_ids,
            "/format" => &self.format_kinds,
            _ => &[],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if self.masking {
            return Ok((0, vec![]));
        }
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        match line.split_once(' ') {
            None => {
                let candidates = COMMANDS
                    .iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .map(|cmd| Pair {
                        display: cmd.to_string(),
                        replacement: cmd.to_string(),
                    })
                    .collect();
                Ok((0, candidates))
            }
            Some((command, argument)) if !argument.contains(' ') => {
                let start = command.len() + 1;
                let candidates = self
                    .argument_candidates(command)
                    .iter()
                    .filter(|candidate| candidate.starts_with(argument))
                    .map(|candidate| Pair {
                        display: candidate.clone(),
                        replacement: candidate.clone(),
                    })
                    .collect();
                Ok((start, candidates))
            }
            Some(_) => Ok((0, vec![])),
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            Owned("*".repeat(line.chars().count()))
        } else if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if !self.masking && line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}
