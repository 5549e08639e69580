//! JSON export of a finished game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, ser::Error as _};
use std::time::Duration;

use crate::{
    game::{Game, PlayerId},
    score::{PlayerStats, game_stats},
};

/// One entry of the exported turn log
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TurnRecord {
    /// Who held the bomb
    pub holder: String,
    pub holder_id: PlayerId,
    /// Who threw it to them, if anyone
    pub source: Option<String>,
    pub source_id: Option<PlayerId>,
    /// Who they threw it to, if anyone
    pub target: Option<String>,
    pub target_id: Option<PlayerId>,
    pub time: DateTime<Utc>,
    /// `None` only for a turn still open at export time
    pub duration: Option<Duration>,
    pub defuse_attempt: bool,
}

/// Snapshot of a game for statistics
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameExport {
    pub started: Option<DateTime<Utc>>,
    pub ended: Option<DateTime<Utc>>,
    pub fake: bool,
    pub defusable: bool,
    pub defused: bool,
    pub players: Vec<PlayerStats>,
    pub turns: Vec<TurnRecord>,
}

impl GameExport {
    pub fn from_game(game: &Game) -> Self {
        let nick = |id: PlayerId| {
            game.player_by_id(id)
                .map(|player| player.nick().to_string())
                .unwrap_or_default()
        };

        let turns = game
            .turns()
            .iter()
            .map(|turn| TurnRecord {
                holder: nick(turn.holder()),
                holder_id: turn.holder(),
                source: turn.source().map(nick),
                source_id: turn.source(),
                target: turn.target().map(nick),
                target_id: turn.target(),
                time: turn.time(),
                duration: turn.duration(),
                defuse_attempt: turn.defuse_attempted(),
            })
            .collect();

        let bomb = game.bomb();

        Self {
            started: game.started(),
            ended: game.ended(),
            fake: bomb.is_some_and(|bomb| bomb.is_fake()),
            defusable: bomb.is_some_and(|bomb| bomb.is_defusable()),
            defused: bomb.is_some_and(|bomb| bomb.is_defused()),
            players: game_stats(game),
            turns,
        }
    }

    /// Rebuilds every player's stats from the turn log, keeping only the
    /// per-player flags from the player records. Turns are matched by roster
    /// id, since a nick may have been taken over by someone else.
    pub fn player_stats(&self) -> Vec<PlayerStats> {
        self.players
            .iter()
            .map(|player| {
                PlayerStats::from_turns(
                    player.id,
                    &player.nick,
                    player.late,
                    player.dead,
                    player.defused,
                    player.defuse_attempt,
                    self.turns
                        .iter()
                        .filter(|turn| turn.holder_id == player.id)
                        .map(|turn| turn.duration),
                )
            })
            .collect()
    }

    /// Tab-indented JSON, one field per line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        String::from_utf8(buf).map_err(serde_json::Error::custom)
    }
}

/// Serializes a game as tab-indented JSON.
pub fn to_json(game: &Game) -> serde_json::Result<String> {
    GameExport::from_game(game).to_json()
}

pub fn from_json(json: &str) -> serde_json::Result<GameExport> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chat::TranscriptChat,
        game::{Bomb, GameConfig, WireFunction},
    };
    use std::sync::Arc;

    #[test]
    fn test_export_resolves_departed_players() {
        let chat = Arc::new(TranscriptChat::new(false));
        let config = GameConfig {
            min_players: 2,
            ..GameConfig::default()
        };
        let mut game = Game::with_chat(config, chat);
        game.start_with(Bomb::new(false, true, vec![WireFunction::Nothing]))
            .unwrap();
        game.join("Alice").unwrap();
        game.join("Bob").unwrap();
        game.join("Carol").unwrap();
        game.finish_warmup().unwrap();
        game.throw("alice", "bob").unwrap();
        game.leave("alice").unwrap();

        let export = GameExport::from_game(&game);
        assert_eq!(export.turns.len(), 2);
        assert_eq!(export.turns[0].holder, "Alice");
        assert_eq!(export.turns[0].target.as_deref(), Some("Bob"));
        assert_eq!(export.turns[1].source.as_deref(), Some("Alice"));
        assert!(export.turns[1].duration.is_none());

        assert_eq!(export.turns[0].holder_id, 0);
        assert_eq!(export.turns[1].source_id, Some(0));

        let nicks: Vec<&str> = export.players.iter().map(|p| p.nick.as_str()).collect();
        assert_eq!(nicks, vec!["Bob", "Carol"]);
        let ids: Vec<PlayerId> = export.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_json_uses_tabs_and_parses_back() {
        let chat = Arc::new(TranscriptChat::new(false));
        let mut game = Game::with_chat(GameConfig::default(), chat);
        game.start().unwrap();
        game.join("Alice").unwrap();

        let json = to_json(&game).unwrap();
        assert!(json.contains("\n\t\"started\""));

        let export = from_json(&json).unwrap();
        assert_eq!(export, GameExport::from_game(&game));
    }
}
