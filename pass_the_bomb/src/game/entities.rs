use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::{borrow::Borrow, fmt, time::Duration};
use tokio::time::Instant;

use super::config::GameConfig;

/// Sanitized nickname, the sole identity key of a participant.
///
/// Chat networks treat `Alice` and ` alice ` as the same person, so the key
/// is trimmed and lowercased. The display form lives on [`Player`].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for Nickname {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Nickname {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for Nickname {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Index into the game's append-only player roster.
pub type PlayerId = usize;

/// Index into the game's append-only turn log.
pub type TurnId = usize;

/// What happens when a wire gets cut.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFunction {
    Nothing,
    LessTime,
    MoreTime,
    Explode,
    Success,
    /// Already cut. Never dealt, only left behind.
    Cut,
}

impl WireFunction {
    /// Functions a fresh wire can carry.
    pub const LIVE: [Self; 5] = [
        Self::Nothing,
        Self::LessTime,
        Self::MoreTime,
        Self::Explode,
        Self::Success,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::LIVE[rng.random_range(0..Self::LIVE.len())]
    }

    /// Whether cutting this wire ends the game.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Explode | Self::Success)
    }
}

impl fmt::Display for WireFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Nothing => "nothing",
            Self::LessTime => "less time",
            Self::MoreTime => "more time",
            Self::Explode => "explode",
            Self::Success => "success",
            Self::Cut => "cut",
        };
        write!(f, "{repr}")
    }
}

/// Rolls a percentage chance: 0 never hits, 100 always does.
fn roll<R: Rng + ?Sized>(rng: &mut R, chance: u8) -> bool {
    rng.random_range(0..100u8) < chance
}

/// Draws a uniformly random duration in `[min, max]` at millisecond
/// resolution.
fn random_duration<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let min_ms = min.as_millis() as u64;
    let max_ms = (max.as_millis() as u64).max(min_ms);
    Duration::from_millis(rng.random_range(min_ms..=max_ms))
}

/// The bomb: fuse, defuse wiring and whoever is holding it.
#[derive(Clone, Debug)]
pub struct Bomb {
    pub(crate) fake: bool,
    pub(crate) defusable: bool,
    pub(crate) wires: Vec<WireFunction>,
    /// Player currently holding the bomb, `None` when it lies on the ground.
    pub(crate) location: Option<PlayerId>,
    pub(crate) detonation: Instant,
    pub(crate) defused: bool,
}

impl Bomb {
    /// Builds a bomb with a known layout. The fuse is set when play begins.
    pub fn new(fake: bool, defusable: bool, wires: Vec<WireFunction>) -> Self {
        Self {
            fake,
            defusable,
            wires,
            location: None,
            detonation: Instant::now(),
            defused: false,
        }
    }

    /// Builds a bomb with a random layout drawn from `config`.
    pub fn arm<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let fake = config.fake_enabled && roll(rng, config.fake_chance);

        let (defusable, wires) = if config.defuse_enabled {
            let defusable = roll(rng, config.defuse_chance);
            let max_wires = config.max_wires.max(config.min_wires);
            let count = rng.random_range(config.min_wires..=max_wires);
            let wires = (0..count).map(|_| WireFunction::random(rng)).collect();
            (defusable, wires)
        } else {
            (false, Vec::new())
        };

        Self::new(fake, defusable, wires)
    }

    pub fn is_fake(&self) -> bool {
        self.fake
    }

    pub fn is_defusable(&self) -> bool {
        self.defusable
    }

    pub fn is_defused(&self) -> bool {
        self.defused
    }

    pub fn wires(&self) -> &[WireFunction] {
        &self.wires
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn location(&self) -> Option<PlayerId> {
        self.location
    }

    pub fn detonation(&self) -> Instant {
        self.detonation
    }

    /// Time left on the fuse, zero once it is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.detonation.saturating_duration_since(now)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.detonation
    }

    /// Resets the fuse to go off somewhere in `[min, max]` from now.
    pub(crate) fn randomize_fuse<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        min: Duration,
        max: Duration,
    ) {
        self.detonation = Instant::now() + random_duration(rng, min, max);
    }

    /// Cuts the wire at a 0-based index and reports what it used to do.
    /// A cut wire stays [`WireFunction::Cut`] forever.
    pub(crate) fn cut(&mut self, index: usize) -> Option<WireFunction> {
        let wire = self.wires.get_mut(index)?;
        let function = *wire;
        *wire = WireFunction::Cut;
        Some(function)
    }
}

/// One participant, keyed by sanitized nickname.
#[derive(Clone, Debug)]
pub struct Player {
    pub(crate) nick: String,
    pub(crate) key: Nickname,
    pub(crate) late: bool,
    pub(crate) turns: Vec<TurnId>,
    pub(crate) defuse_attempt: bool,
    pub(crate) defused: bool,
    pub(crate) dead: bool,
}

impl Player {
    pub(crate) fn new(nick: &str, late: bool) -> Self {
        Self {
            nick: nick.trim().to_string(),
            key: Nickname::new(nick),
            late,
            turns: Vec::new(),
            defuse_attempt: false,
            defused: false,
            dead: false,
        }
    }

    /// Display nickname.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn key(&self) -> &Nickname {
        &self.key
    }

    /// Joined after the join window closed.
    pub fn is_late(&self) -> bool {
        self.late
    }

    /// Turns this player held the bomb, in order.
    pub fn turns(&self) -> &[TurnId] {
        &self.turns
    }

    pub fn defuse_attempted(&self) -> bool {
        self.defuse_attempt
    }

    pub fn has_defused(&self) -> bool {
        self.defused
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}

/// One uninterrupted stretch of somebody holding the bomb.
#[derive(Clone, Debug)]
pub struct Turn {
    pub(crate) holder: PlayerId,
    pub(crate) source: Option<PlayerId>,
    pub(crate) target: Option<PlayerId>,
    pub(crate) time: DateTime<Utc>,
    pub(crate) started_at: Instant,
    pub(crate) duration: Option<Duration>,
    pub(crate) defuse_attempt: bool,
}

impl Turn {
    pub(crate) fn open(holder: PlayerId, source: Option<PlayerId>) -> Self {
        Self {
            holder,
            source,
            target: None,
            time: Utc::now(),
            started_at: Instant::now(),
            duration: None,
            defuse_attempt: false,
        }
    }

    pub(crate) fn close(&mut self, target: Option<PlayerId>) {
        self.target = target;
        self.duration = Some(self.started_at.elapsed());
    }

    pub fn holder(&self) -> PlayerId {
        self.holder
    }

    /// Who threw the bomb here. `None` for the first turn and pickups.
    pub fn source(&self) -> Option<PlayerId> {
        self.source
    }

    /// Who the bomb went to next. `None` while open, after a drop, or at the end.
    pub fn target(&self) -> Option<PlayerId> {
        self.target
    }

    /// Wall-clock start time.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Monotonic start time.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Set once the turn is closed.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_open(&self) -> bool {
        self.duration.is_none()
    }

    pub fn defuse_attempted(&self) -> bool {
        self.defuse_attempt
    }
}
