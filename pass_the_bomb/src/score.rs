//! Post-game scoring.
//!
//! Every calculator is a plain function over [`PlayerStats`], so the same
//! scores come out whether the stats were taken from a live [`Game`] or
//! rebuilt from an exported turn log. Scores are whole seconds; dead players
//! always score zero.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

use crate::game::{Game, Player, PlayerId};

/// Bonus for cutting the right wire.
const DEFUSE_BONUS_SECS: u64 = 5 * 60;

/// Bonus for having tried at all.
const ATTEMPT_BONUS_SECS: u64 = 60;

/// Bonus for a patient player whose mean turn exceeds a minute.
const PATIENCE_BONUS_SECS: u64 = 5 * 60;
const PATIENCE_THRESHOLD: Duration = Duration::from_secs(60);

/// Everything scoring needs to know about one player
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerStats {
    /// Roster slot, stable for the whole round even if the nick is reused
    pub id: PlayerId,
    pub nick: String,
    pub late: bool,
    pub dead: bool,
    pub defused: bool,
    pub defuse_attempt: bool,
    /// Total time holding the bomb
    pub duration: Duration,
    /// `duration` divided by `turns`
    pub mean_duration: Duration,
    pub turns: usize,
}

impl PlayerStats {
    /// Builds stats from the durations of every turn the player held. Turns
    /// still open count towards `turns` but not towards `duration`.
    pub fn from_turns(
        id: PlayerId,
        nick: &str,
        late: bool,
        dead: bool,
        defused: bool,
        defuse_attempt: bool,
        durations: impl IntoIterator<Item = Option<Duration>>,
    ) -> Self {
        let mut turns = 0usize;
        let mut duration = Duration::ZERO;
        for held in durations {
            turns += 1;
            duration += held.unwrap_or_default();
        }

        let mean_duration = match u32::try_from(turns) {
            Ok(0) => Duration::ZERO,
            Ok(n) => duration / n,
            Err(_) => Duration::ZERO,
        };

        Self {
            id,
            nick: nick.to_string(),
            late,
            dead,
            defused,
            defuse_attempt,
            duration,
            mean_duration,
            turns,
        }
    }

    pub fn from_player(game: &Game, id: PlayerId, player: &Player) -> Self {
        let turns = game.turns();
        Self::from_turns(
            id,
            player.nick(),
            player.is_late(),
            player.is_dead(),
            player.has_defused(),
            player.defuse_attempted(),
            player.turns().iter().map(|&id| turns[id].duration()),
        )
    }
}

/// Stats for every current participant, in join order.
pub fn game_stats(game: &Game) -> Vec<PlayerStats> {
    game.participant_entries()
        .map(|(id, player)| PlayerStats::from_player(game, id, player))
        .collect()
}

/// A single line on the scoreboard
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreCard {
    pub nick: String,
    pub score: u64,
}

/// Function able to score one player
pub type ScoreCalc = fn(&PlayerStats) -> ScoreCard;

fn card(stats: &PlayerStats, score: impl FnOnce() -> u64) -> ScoreCard {
    ScoreCard {
        nick: stats.nick.clone(),
        score: if stats.dead { 0 } else { score() },
    }
}

/// Seconds spent holding the bomb.
pub fn duration_score(stats: &PlayerStats) -> ScoreCard {
    card(stats, || stats.duration.as_secs())
}

/// Mean seconds per turn.
pub fn mean_duration_score(stats: &PlayerStats) -> ScoreCard {
    card(stats, || stats.mean_duration.as_secs())
}

/// Seconds held, plus five minutes for defusing the bomb.
pub fn defuse_score(stats: &PlayerStats) -> ScoreCard {
    card(stats, || {
        let mut score = stats.duration.as_secs();
        if stats.defused {
            score += DEFUSE_BONUS_SECS;
        }
        score
    })
}

/// Uses as much of the stats as possible: seconds held, a minute for
/// trying to defuse, five for succeeding and five for a mean turn over a
/// minute.
pub fn complex_score(stats: &PlayerStats) -> ScoreCard {
    card(stats, || {
        let mut score = stats.duration.as_secs();
        if stats.defuse_attempt {
            score += ATTEMPT_BONUS_SECS;
        }
        if stats.defused {
            score += DEFUSE_BONUS_SECS;
        }
        if stats.mean_duration > PATIENCE_THRESHOLD {
            score += PATIENCE_BONUS_SECS;
        }
        score
    })
}

/// Named score variants, for configuration
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    Duration,
    Mean,
    Defuse,
    #[default]
    Complex,
}

impl ScoreMode {
    pub fn calc(self) -> ScoreCalc {
        match self {
            Self::Duration => duration_score,
            Self::Mean => mean_duration_score,
            Self::Defuse => defuse_score,
            Self::Complex => complex_score,
        }
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration => write!(f, "duration"),
            Self::Mean => write!(f, "mean"),
            Self::Defuse => write!(f, "defuse"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

impl FromStr for ScoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duration" => Ok(Self::Duration),
            "mean" => Ok(Self::Mean),
            "defuse" => Ok(Self::Defuse),
            "complex" => Ok(Self::Complex),
            other => Err(format!("unknown score mode: {other}")),
        }
    }
}

/// Score cards for a whole game
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScoreBoard(Vec<ScoreCard>);

impl ScoreBoard {
    pub fn new(cards: Vec<ScoreCard>) -> Self {
        Self(cards)
    }

    pub fn from_stats(stats: &[PlayerStats], calc: ScoreCalc) -> Self {
        Self(stats.iter().map(calc).collect())
    }

    pub fn for_game(game: &Game, calc: ScoreCalc) -> Self {
        Self::from_stats(&game_stats(game), calc)
    }

    /// Sorts ascending by score. Ties keep their order.
    pub fn sort(&mut self) {
        self.0.sort_by_key(|card| card.score);
    }

    /// Cards from best to worst.
    pub fn leaderboard(&self) -> Vec<ScoreCard> {
        let mut cards = self.0.clone();
        cards.sort_by(|a, b| b.score.cmp(&a.score));
        cards
    }

    pub fn cards(&self) -> &[ScoreCard] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
