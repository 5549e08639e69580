//! Chat command parsing.

use crate::game::constants::COMMAND_PREFIX;

/// A player command recognized in a chat line
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// `!join`
    Join,
    /// `!pass <nick>`
    Pass(String),
    /// `!defuse`
    Defuse,
    /// `!cut <wire>`
    Cut(u8),
    /// `!players`
    Players,
    /// `!pickup`
    Pickup,
}

impl Command {
    /// Finds a command in a chat line. Lines without the prefix, unknown
    /// verbs and verbs missing their argument yield `None`.
    pub fn parse(message: &str) -> Option<Self> {
        let body = message.trim().strip_prefix(COMMAND_PREFIX)?;
        let mut args = body.split_whitespace();

        match args.next()?.to_lowercase().as_str() {
            "join" => Some(Self::Join),
            "pass" => args.next().map(|nick| Self::Pass(nick.to_string())),
            "defuse" => Some(Self::Defuse),
            "cut" => args.next()?.parse().ok().map(Self::Cut),
            "players" => Some(Self::Players),
            "pickup" => Some(Self::Pickup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse("!join"), Some(Command::Join));
        assert_eq!(
            Command::parse("!pass Bob"),
            Some(Command::Pass("Bob".to_string()))
        );
        assert_eq!(Command::parse("  !DEFUSE "), Some(Command::Defuse));
        assert_eq!(Command::parse("!cut 3"), Some(Command::Cut(3)));
        assert_eq!(Command::parse("!players"), Some(Command::Players));
        assert_eq!(Command::parse("!pickup"), Some(Command::Pickup));
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(Command::parse("join"), None);
        assert_eq!(Command::parse("!"), None);
        assert_eq!(Command::parse("!dance"), None);
        assert_eq!(Command::parse("!pass"), None);
        assert_eq!(Command::parse("!cut"), None);
        assert_eq!(Command::parse("!cut three"), None);
        assert_eq!(Command::parse("!cut 300"), None);
    }

    #[test]
    fn test_parse_keeps_wire_zero_for_the_game_to_reject() {
        assert_eq!(Command::parse("!cut 0"), Some(Command::Cut(0)));
    }
}
