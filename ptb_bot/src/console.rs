//! Terminal stand-in for a chat room.
//!
//! Everyone types into the same terminal as `<nick>: <message>`, and the
//! host drives the game with `/`-prefixed admin lines.

use pass_the_bomb::Chat;
use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;

/// Chat room printed to stdout
#[derive(Debug, Default)]
pub struct ConsoleChat {
    operator: bool,
    banned: Mutex<HashSet<String>>,
}

impl ConsoleChat {
    pub fn new(operator: bool) -> Self {
        Self {
            operator,
            banned: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_banned(&self, nick: &str) -> bool {
        self.banned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&nick.to_lowercase())
    }
}

impl Chat for ConsoleChat {
    fn public(&self, message: &str) {
        println!("<bomb> {message}");
    }

    fn private(&self, nick: &str, message: &str) {
        println!("<bomb> (to {nick}) {message}");
    }

    fn kick(&self, nick: &str, reason: &str) {
        println!("*** {nick} was kicked ({reason})");
    }

    fn is_operator(&self) -> bool {
        self.operator
    }

    fn ban(&self, nick: &str) -> bool {
        if !self.operator {
            return false;
        }
        self.banned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(nick.to_lowercase());
        println!("*** {nick} was banned");
        true
    }

    fn unban(&self, nick: &str) {
        let removed = self
            .banned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&nick.to_lowercase());
        if removed {
            println!("*** {nick} may return");
        }
    }
}

/// Host commands
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Admin {
    Start,
    Stop,
    Leave(String),
    Rename { old: String, new: String },
    Players,
    Scores,
    Export,
    Quit,
}

/// One line typed into the console
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// Somebody said something in the room
    Say { nick: String, message: String },
    Admin(Admin),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum LineError {
    #[error("nothing to do")]
    Empty,
    #[error("unknown admin command /{0}")]
    UnknownAdmin(String),
    #[error("/{command} needs {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },
    #[error("expected <nick>: <message>")]
    Malformed,
}

impl Line {
    pub fn parse(line: &str) -> Result<Self, LineError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(LineError::Empty);
        }

        if let Some(admin) = line.strip_prefix('/') {
            return parse_admin(admin).map(Self::Admin);
        }

        let (nick, message) = line.split_once(':').ok_or(LineError::Malformed)?;
        let nick = nick.trim();
        if nick.is_empty() || nick.contains(char::is_whitespace) {
            return Err(LineError::Malformed);
        }

        Ok(Self::Say {
            nick: nick.to_string(),
            message: message.trim().to_string(),
        })
    }
}

fn parse_admin(body: &str) -> Result<Admin, LineError> {
    let mut args = body.split_whitespace();
    let verb = args.next().unwrap_or_default().to_lowercase();

    match verb.as_str() {
        "start" => Ok(Admin::Start),
        "stop" => Ok(Admin::Stop),
        "leave" => args
            .next()
            .map(|nick| Admin::Leave(nick.to_string()))
            .ok_or(LineError::MissingArgument {
                command: "leave",
                usage: "<nick>",
            }),
        "rename" => match (args.next(), args.next()) {
            (Some(old), Some(new)) => Ok(Admin::Rename {
                old: old.to_string(),
                new: new.to_string(),
            }),
            _ => Err(LineError::MissingArgument {
                command: "rename",
                usage: "<old> <new>",
            }),
        },
        "players" => Ok(Admin::Players),
        "scores" => Ok(Admin::Scores),
        "export" => Ok(Admin::Export),
        "quit" | "exit" => Ok(Admin::Quit),
        _ => Err(LineError::UnknownAdmin(verb)),
    }
}
