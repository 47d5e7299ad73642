use spit::{PlayAction, messages::ClientMessage};
use std::fmt;

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A play needs both a slot and a pile.
    MissingArgument(&'static str),
    /// Slot or pile isn't a number.
    InvalidIndex(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(what) => {
                write!(f, "Play needs a {what} (e.g., 'play 0 1')")
            }
            Self::InvalidIndex(value) => write!(
                f,
                "Invalid index '{}'. Slots and piles are numbered from 0",
                value
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// What the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Something to send to the server.
    Send(ClientMessage),
    Help,
}

pub const COMMANDS_HELP: &str = "\
commands:
  play SLOT PILE   (or p SLOT PILE) put a layout card onto a center pile
  quit             (or q) leave the game
  help             show this message";

/// Parse a command string into a [`Command`].
///
/// # Examples
///
/// ```
/// use spit_client::commands::{Command, parse_command};
/// use spit::{PlayAction, messages::ClientMessage};
///
/// assert_eq!(
///     parse_command("p 2 0"),
///     Ok(Command::Send(ClientMessage::Play(PlayAction { slot: 2, pile: 0 })))
/// );
/// assert_eq!(parse_command("quit"), Ok(Command::Send(ClientMessage::Quitting)));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed {
        "q" | "quit" => return Ok(Command::Send(ClientMessage::Quitting)),
        "h" | "help" => return Ok(Command::Help),
        _ => {}
    }

    // Parse multi-word commands
    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"p" | &"play") => parse_play_command(&parts),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse a play command: "play SLOT PILE"
fn parse_play_command(parts: &[&str]) -> Result<Command, ParseError> {
    let index = |position: usize, what: &'static str| -> Result<usize, ParseError> {
        let value = parts.get(position).ok_or(ParseError::MissingArgument(what))?;
        value
            .parse()
            .map_err(|_| ParseError::InvalidIndex(value.to_string()))
    };
    let slot = index(1, "slot")?;
    let pile = index(2, "pile")?;
    Ok(Command::Send(ClientMessage::Play(PlayAction { slot, pile })))
}
