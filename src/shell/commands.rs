// Command parsing for the terminal shell
// A line starting with ':' is a command, "::" escapes a literal leading colon

use crate::core::search::{Direction, FindOptions};
use crate::serial::parse_baud;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command :{0} (try :help)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid baud rate: {0}")]
    InvalidBaud(String),

    #[error("Invalid tab number: {0}")]
    InvalidTab(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text to send to the active tab's device
    Send(String),
    Help,
    Ports,
    Tabs,
    Open(String),
    Close,
    /// 1-based tab number as typed
    Select(usize),
    Connect,
    Disconnect,
    Baud(u32),
    Timestamps(bool),
    /// Show the zone when `None`
    TimeZone(Option<String>),
    Zones(Option<String>),
    Find { query: String, options: FindOptions },
    Save(Option<PathBuf>),
    Log(Option<PathBuf>),
    NoLog,
    Clear,
    Quit,
}

pub const HELP: &str = "\
Lines not starting with ':' are sent to the active tab (CRLF appended).
Use '::' to send a line that starts with ':'.

  :ports               list detected serial ports not yet open
  :tabs                list open tabs
  :open <port>         open a tab for <port>
  :close               close the active tab
  :tab <n>             switch to tab <n>
  :connect             connect the active tab
  :disconnect          disconnect the active tab
  :baud <rate>         baud rate for the next connect
  :ts on|off           timestamp received lines
  :tz [zone]           show or set the time zone (IANA name or 'local')
  :zones [filter]      list time zones
  :find [-c] [-u] <text>  find text (-c match case, -u search up)
  :save [path]         save the active tab's output
  :log [path]          append received output to a file
  :nolog               stop logging
  :clear               clear the active tab's output
  :quit                disconnect everything and exit";

/// Parse one line of user input
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(body) = line.strip_prefix(':') else {
        return Ok(Command::Send(line.to_string()));
    };
    if body.starts_with(':') {
        return Ok(Command::Send(body.to_string()));
    }

    let body = body.trim();
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    match name {
        "help" | "h" | "?" => Ok(Command::Help),
        "ports" => Ok(Command::Ports),
        "tabs" => Ok(Command::Tabs),
        "open" => arg.map(Command::Open).ok_or(CommandError::Usage(":open <port>")),
        "close" => Ok(Command::Close),
        "tab" => parse_tab(rest),
        "connect" => Ok(Command::Connect),
        "disconnect" => Ok(Command::Disconnect),
        "baud" => {
            if rest.is_empty() {
                return Err(CommandError::Usage(":baud <rate>"));
            }
            parse_baud(rest)
                .map(Command::Baud)
                .map_err(|_| CommandError::InvalidBaud(rest.to_string()))
        }
        "ts" => match rest.to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(Command::Timestamps(true)),
            "off" | "0" | "false" => Ok(Command::Timestamps(false)),
            _ => Err(CommandError::Usage(":ts on|off")),
        },
        "tz" => Ok(Command::TimeZone(arg)),
        "zones" => Ok(Command::Zones(arg)),
        "find" => parse_find(rest),
        "save" => Ok(Command::Save(arg.map(PathBuf::from))),
        "log" => Ok(Command::Log(arg.map(PathBuf::from))),
        "nolog" => Ok(Command::NoLog),
        "clear" => Ok(Command::Clear),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_tab(rest: &str) -> Result<Command> {
    if rest.is_empty() {
        return Err(CommandError::Usage(":tab <n>"));
    }
    match rest.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Command::Select(n)),
        _ => Err(CommandError::InvalidTab(rest.to_string())),
    }
}

fn parse_find(rest: &str) -> Result<Command> {
    let mut options = FindOptions::default();
    let mut remaining = rest;

    // Leading flags; everything after them is the literal query
    loop {
        let (word, after) = match remaining.split_once(char::is_whitespace) {
            Some((word, after)) => (word, after.trim_start()),
            None => (remaining, ""),
        };
        match word {
            "-c" => options.match_case = true,
            "-u" => options.direction = Direction::Up,
            "-cu" | "-uc" => {
                options.match_case = true;
                options.direction = Direction::Up;
            }
            _ => break,
        }
        remaining = after;
    }

    if remaining.is_empty() {
        return Err(CommandError::Usage(":find [-c] [-u] <text>"));
    }
    Ok(Command::Find {
        query: remaining.to_string(),
        options,
    })
}
