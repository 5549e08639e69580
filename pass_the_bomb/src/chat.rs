//! Chat capabilities the game needs from whatever room it is played in.

use std::sync::{Mutex, PoisonError};

/// The room the game is played in.
///
/// Implementations must not block for long: calls are made from inside the
/// session actor while it holds the game.
pub trait Chat: Send + Sync {
    /// Sends a message to everyone in the room.
    fn public(&self, message: &str);

    /// Sends a message to a single participant.
    fn private(&self, nick: &str, message: &str);

    /// Removes a participant from the room.
    fn kick(&self, nick: &str, reason: &str);

    /// Whether the bot currently has kick/ban privilege.
    fn is_operator(&self) -> bool;

    /// Bans a nickname. Returns false when the ban did not take.
    fn ban(&self, nick: &str) -> bool;

    /// Lifts a ban placed by [`Chat::ban`].
    fn unban(&self, nick: &str);
}

/// A single call made against a [`TranscriptChat`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCall {
    Public(String),
    Private { nick: String, message: String },
    Kick { nick: String, reason: String },
    Ban(String),
    Unban(String),
}

/// Chat that records every call instead of talking to a network.
///
/// Handy for replays, dry runs and assertions.
#[derive(Debug, Default)]
pub struct TranscriptChat {
    operator: bool,
    calls: Mutex<Vec<ChatCall>>,
}

impl TranscriptChat {
    pub fn new(operator: bool) -> Self {
        Self {
            operator,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Everything recorded so far, oldest first.
    pub fn calls(&self) -> Vec<ChatCall> {
        self.lock().clone()
    }

    /// Public messages only.
    pub fn public_messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ChatCall::Public(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ChatCall) -> bool) -> usize {
        self.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: ChatCall) {
        self.lock().push(call);
    }
}

impl Chat for TranscriptChat {
    fn public(&self, message: &str) {
        self.record(ChatCall::Public(message.to_string()));
    }

    fn private(&self, nick: &str, message: &str) {
        self.record(ChatCall::Private {
            nick: nick.to_string(),
            message: message.to_string(),
        });
    }

    fn kick(&self, nick: &str, reason: &str) {
        self.record(ChatCall::Kick {
            nick: nick.to_string(),
            reason: reason.to_string(),
        });
    }

    fn is_operator(&self) -> bool {
        self.operator
    }

    fn ban(&self, nick: &str) -> bool {
        self.record(ChatCall::Ban(nick.to_string()));
        self.operator
    }

    fn unban(&self, nick: &str) {
        self.record(ChatCall::Unban(nick.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_records_in_order() {
        let chat = TranscriptChat::new(true);
        chat.public("hello");
        chat.private("alice", "psst");
        chat.kick("bob", "boom");

        assert_eq!(
            chat.calls(),
            vec![
                ChatCall::Public("hello".to_string()),
                ChatCall::Private {
                    nick: "alice".to_string(),
                    message: "psst".to_string()
                },
                ChatCall::Kick {
                    nick: "bob".to_string(),
                    reason: "boom".to_string()
                },
            ]
        );
        assert_eq!(chat.public_messages(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_ban_follows_operator_privilege() {
        assert!(TranscriptChat::new(true).ban("alice"));
        assert!(!TranscriptChat::new(false).ban("alice"));
    }
}
