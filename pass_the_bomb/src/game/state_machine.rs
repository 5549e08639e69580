//! Pass-the-bomb game state machine.
//!
//! [`Game`] is a synchronous aggregate: every operation takes `&mut self`
//! and either applies a whole transition or rejects it with a [`GameError`]
//! and no mutation beyond the corrective broadcast. Timers live outside, in
//! the session actor, which calls [`Game::explain`], [`Game::finish_warmup`]
//! and [`Game::check_fuse`] when they fire.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::time::Instant;

use super::{
    config::GameConfig,
    constants::{LESS_TIME_MAX_SECS, LESS_TIME_MIN_SECS, MORE_TIME_EXTRA_SECS},
    entities::{Bomb, Nickname, Player, PlayerId, Turn, TurnId, WireFunction},
    text,
};
use crate::chat::Chat;

/// Lifecycle phase of a game
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// No game running.
    #[default]
    Init,
    /// Join window open, rules being explained.
    Warmup,
    /// Bomb is being passed around.
    Playing,
    /// Holder is choosing a wire to cut.
    Defuse,
    /// Bomb went off, fizzled or was defused.
    Ended,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Init => "idle",
            Self::Warmup => "warming up",
            Self::Playing => "playing",
            Self::Defuse => "defusing",
            Self::Ended => "over",
        };
        write!(f, "{repr}")
    }
}

/// Reasons a game operation was rejected
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("no chat bound to the game")]
    ChatUnbound,
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
    #[error("game already in progress")]
    AlreadyActive,
    #[error("not allowed while the game is {0}")]
    InvalidState(GameState),
    #[error("need {required}+ players, got {joined}")]
    NotEnoughPlayers { joined: usize, required: usize },
    #[error("already playing")]
    AlreadyJoined,
    #[error("not playing")]
    UnknownPlayer,
    #[error("not holding the bomb")]
    NotHolder,
    #[error("can't throw the bomb to yourself")]
    ThrowToSelf,
    #[error("the bomb isn't on the ground")]
    BombNotOnGround,
    #[error("this bomb can't be defused")]
    NotDefusable,
    #[error("already tried to defuse")]
    DefuseAlreadyAttempted,
    #[error("there is no wire {0}")]
    InvalidWire(u8),
    #[error("nickname {0} is already taken")]
    NicknameTaken(String),
    #[error("game session is closed")]
    SessionClosed,
}

/// Things that happened during a game, queued for whoever drives it
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    WarmupStarted,
    WarmupFailed { joined: usize },
    Joined { nick: String, late: bool },
    Left(String),
    Renamed { from: String, to: String },
    PlayStarted { first: String },
    Passed { from: String, to: String },
    Dropped { by: String },
    PickedUp(String),
    DefuseStarted(String),
    WireCut { nick: String, wire: u8, function: WireFunction },
    Defused(String),
    Detonated { holder: Option<String>, fake: bool },
    Banned { nick: String, unban_after: Duration },
    Kicked(String),
    Ended,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WarmupStarted => "warm-up started".to_string(),
            Self::WarmupFailed { joined } => {
                format!("warm-up failed with {joined} player(s)")
            }
            Self::Joined { nick, late: true } => format!("{nick} joined late"),
            Self::Joined { nick, late: false } => format!("{nick} joined"),
            Self::Left(nick) => format!("{nick} left"),
            Self::Renamed { from, to } => format!("{from} renamed to {to}"),
            Self::PlayStarted { first } => format!("play started with {first}"),
            Self::Passed { from, to } => format!("{from} passed to {to}"),
            Self::Dropped { by } => format!("{by} dropped the bomb"),
            Self::PickedUp(nick) => format!("{nick} picked up the bomb"),
            Self::DefuseStarted(nick) => format!("{nick} started defusing"),
            Self::WireCut {
                nick,
                wire,
                function,
            } => format!("{nick} cut wire {wire} ({function})"),
            Self::Defused(nick) => format!("{nick} defused the bomb"),
            Self::Detonated {
                holder: Some(nick),
                fake,
            } => format!("bomb detonated on {nick} (fake: {fake})"),
            Self::Detonated { holder: None, fake } => {
                format!("bomb detonated on the ground (fake: {fake})")
            }
            Self::Banned { nick, unban_after } => {
                format!("{nick} banned for {}s", unban_after.as_secs())
            }
            Self::Kicked(nick) => format!("{nick} kicked"),
            Self::Ended => "game ended".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Where the bomb went after a throw
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThrowOutcome {
    Passed,
    Dropped,
}

/// A single round of pass-the-bomb.
///
/// Every operation queues [`GameEvent`]s for the driver. The queue is only
/// emptied by [`Game::drain_events`], so a caller driving a `Game` directly
/// rather than through [`crate::GameHandle`] has to drain it itself.
pub struct Game {
    config: GameConfig,
    chat: Option<Arc<dyn Chat>>,
    rng: StdRng,
    state: GameState,
    bomb: Option<Bomb>,
    /// Everyone who joined this round, in join order. Never shrinks, so
    /// historical turns always resolve.
    roster: Vec<Player>,
    /// Current participants.
    players: HashMap<Nickname, PlayerId>,
    first: Option<PlayerId>,
    turns: Vec<Turn>,
    /// The open turn, `None` while the bomb is on the ground.
    turn: Option<TurnId>,
    started: Option<DateTime<Utc>>,
    ended: Option<DateTime<Utc>>,
    /// Pending until [`Game::drain_events`].
    events: VecDeque<GameEvent>,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("bomb", &self.bomb)
            .field("players", &self.players)
            .field("turns", &self.turns.len())
            .field("started", &self.started)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Creates an idle game with no chat bound yet.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            chat: None,
            rng: StdRng::from_rng(&mut rand::rng()),
            state: GameState::Init,
            bomb: None,
            roster: Vec::new(),
            players: HashMap::new(),
            first: None,
            turns: Vec::new(),
            turn: None,
            started: None,
            ended: None,
            events: VecDeque::new(),
        }
    }

    pub fn with_chat(config: GameConfig, chat: Arc<dyn Chat>) -> Self {
        let mut game = Self::new(config);
        game.bind_chat(chat);
        game
    }

    /// Replaces the random source, e.g. with a seeded one for replays.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn bind_chat(&mut self, chat: Arc<dyn Chat>) {
        self.chat = Some(chat);
    }

    pub fn chat(&self) -> Option<&Arc<dyn Chat>> {
        self.chat.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Whether players can currently interact with the game.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, GameState::Init | GameState::Ended)
    }

    pub fn bomb(&self) -> Option<&Bomb> {
        self.bomb.as_ref()
    }

    pub fn player(&self, nick: &str) -> Option<&Player> {
        self.players
            .get(nick.trim().to_lowercase().as_str())
            .map(|&id| &self.roster[id])
    }

    pub fn player_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.roster.get(id)
    }

    /// Everyone who joined this round, including those who left since.
    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Current participants, in join order.
    pub fn participants(&self) -> impl Iterator<Item = &Player> + '_ {
        self.participant_entries().map(|(_, player)| player)
    }

    /// Current participants with their roster ids, in join order.
    pub fn participant_entries(&self) -> impl Iterator<Item = (PlayerId, &Player)> + '_ {
        self.roster
            .iter()
            .enumerate()
            .filter(|(id, player)| self.players.get(&player.key) == Some(id))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Player who gets (or got) the bomb first.
    pub fn first(&self) -> Option<&Player> {
        self.first
            .or_else(|| self.earliest_participant())
            .map(|id| &self.roster[id])
    }

    /// Player currently holding the bomb.
    pub fn holder(&self) -> Option<&Player> {
        self.bomb
            .as_ref()
            .and_then(|bomb| bomb.location)
            .map(|id| &self.roster[id])
    }

    /// Complete turn log, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn current_turn(&self) -> Option<&Turn> {
        self.turn.map(|id| &self.turns[id])
    }

    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.started
    }

    pub fn ended(&self) -> Option<DateTime<Utc>> {
        self.ended
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Opens the join window with a freshly armed bomb.
    ///
    /// This only flips the game into [`GameState::Warmup`]; the caller is
    /// responsible for calling [`Game::explain`] during the window and
    /// [`Game::finish_warmup`] when it closes.
    pub fn start(&mut self) -> Result<(), GameError> {
        self.check_can_start()?;
        let bomb = Bomb::arm(&self.config, &mut self.rng);
        self.begin_warmup(bomb);
        Ok(())
    }

    /// Same as [`Game::start`], but with a pre-built bomb.
    pub fn start_with(&mut self, bomb: Bomb) -> Result<(), GameError> {
        self.check_can_start()?;
        self.begin_warmup(bomb);
        Ok(())
    }

    /// Explanatory broadcast number `tick` (1 to 4) of the join window.
    pub fn explain(&mut self, tick: u8) -> Result<(), GameError> {
        if self.state != GameState::Warmup {
            return Err(GameError::InvalidState(self.state));
        }

        match tick {
            1 => self.announce(&text::help_throw()),
            2 => self.announce(text::HELP_SCORE),
            3 => self.announce(&text::help_defuse()),
            4 => {
                // Snapshot only; players may still leave before the window closes.
                if self.players.len() >= self.config.min_players
                    && let Some(first) = self.first()
                {
                    let message = text::help_start(first.nick());
                    self.announce(&message);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Closes the join window: hands the bomb to the first player and lights
    /// the fuse, or scraps the round if too few joined.
    pub fn finish_warmup(&mut self) -> Result<(), GameError> {
        if self.state != GameState::Warmup {
            return Err(GameError::InvalidState(self.state));
        }

        let joined = self.players.len();
        let required = self.config.min_players;
        let first = match self.earliest_participant() {
            Some(first) if joined >= required => first,
            _ => {
                self.announce(text::START_FAIL);
                self.reset();
                self.events.push_back(GameEvent::WarmupFailed { joined });
                info!("Warm-up failed: {joined}/{required} players");
                return Err(GameError::NotEnoughPlayers { joined, required });
            }
        };

        self.first = Some(first);
        self.open_turn(first, None);

        let (min, max) = (self.config.min_fuse(), self.config.max_fuse());
        if let Some(bomb) = self.bomb.as_mut() {
            bomb.randomize_fuse(&mut self.rng, min, max);
        }
        self.state = GameState::Playing;

        let nick = self.roster[first].nick.clone();
        self.announce(&text::start_go(&nick));
        self.events.push_back(GameEvent::PlayStarted { first: nick });
        info!("Game started with {joined} players");

        Ok(())
    }

    /// Adds a participant. Allowed during warm-up and while playing.
    pub fn join(&mut self, nick: &str) -> Result<(), GameError> {
        if !matches!(self.state, GameState::Warmup | GameState::Playing) {
            return Err(GameError::InvalidState(self.state));
        }

        let key = Nickname::new(nick);
        if self.players.contains_key(&key) {
            return Err(GameError::AlreadyJoined);
        }

        let late = self.state != GameState::Warmup;

        // Someone coming back keeps their history, including a used-up
        // defuse attempt.
        let id = match self.roster.iter().rposition(|player| player.key == key) {
            Some(id) => {
                self.roster[id].nick = nick.trim().to_string();
                self.roster[id].late |= late;
                id
            }
            None => {
                self.roster.push(Player::new(nick, late));
                self.roster.len() - 1
            }
        };
        let display = self.roster[id].nick.clone();
        self.players.insert(key, id);

        if late {
            self.announce(&text::player_joined_late(&display));
        } else if let Some(chat) = &self.chat {
            chat.private(&display, text::PLAYER_JOINED);
        }

        self.events.push_back(GameEvent::Joined {
            nick: display,
            late,
        });

        Ok(())
    }

    /// Throws the bomb from its holder to `target`. A target that isn't
    /// playing makes the bomb drop to the ground.
    pub fn throw(&mut self, source: &str, target: &str) -> Result<ThrowOutcome, GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::InvalidState(self.state));
        }

        let holder = self.require_holder(source)?;
        let holder_nick = self.roster[holder].nick.clone();
        let target_key = Nickname::new(target);

        if target_key == self.roster[holder].key {
            self.announce(&text::bomb_thrown_self(&holder_nick));
            return Err(GameError::ThrowToSelf);
        }

        let Some(&next) = self.players.get(&target_key) else {
            self.announce(&text::bomb_dropped(target.trim()));
            self.pass_bomb(None, holder);
            self.events.push_back(GameEvent::Dropped { by: holder_nick });
            return Ok(ThrowOutcome::Dropped);
        };

        self.pass_bomb(Some(next), holder);

        let next_nick = self.roster[next].nick.clone();
        self.announce(&text::bomb_thrown(&holder_nick, &next_nick));
        self.events.push_back(GameEvent::Passed {
            from: holder_nick,
            to: next_nick,
        });

        Ok(ThrowOutcome::Passed)
    }

    /// Picks the bomb up off the ground.
    pub fn pickup(&mut self, nick: &str) -> Result<(), GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::InvalidState(self.state));
        }

        if self.bomb.as_ref().is_none_or(|bomb| bomb.location.is_some()) {
            return Err(GameError::BombNotOnGround);
        }

        let id = self.player_id(nick)?;
        self.open_turn(id, None);

        let display = self.roster[id].nick.clone();
        self.announce(&text::bomb_picked_up(&display));
        self.events.push_back(GameEvent::PickedUp(display));

        Ok(())
    }

    /// Starts the wire-cutting minigame for the holder.
    pub fn defuse(&mut self, nick: &str) -> Result<(), GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::InvalidState(self.state));
        }

        let holder = self.require_holder(nick)?;
        let display = self.roster[holder].nick.clone();

        if self.roster[holder].defuse_attempt {
            self.announce(&text::defuse_tried(&display));
            self.state = GameState::Playing;
            return Err(GameError::DefuseAlreadyAttempted);
        }

        let Some(bomb) = self.bomb.as_ref().filter(|bomb| bomb.defusable) else {
            self.announce(&text::defuse_disabled(&display));
            return Err(GameError::NotDefusable);
        };

        let wires = bomb.wire_count();
        self.state = GameState::Defuse;
        self.announce(&text::defuse(wires));
        self.events.push_back(GameEvent::DefuseStarted(display));

        Ok(())
    }

    /// Cuts wire number `wire` (1-based). Returns what the wire did.
    ///
    /// A wire number out of range does not use up the attempt. Any other cut
    /// does, whatever the wire turns out to be.
    pub fn cut(&mut self, nick: &str, wire: u8) -> Result<WireFunction, GameError> {
        if !matches!(self.state, GameState::Playing | GameState::Defuse) {
            return Err(GameError::InvalidState(self.state));
        }

        let holder = self.require_holder(nick)?;
        let display = self.roster[holder].nick.clone();

        let wire_count = match self.bomb.as_ref() {
            Some(bomb) if bomb.defusable => bomb.wire_count(),
            _ => return Err(GameError::NotDefusable),
        };

        if wire == 0 || usize::from(wire) > wire_count {
            self.announce(&text::defuse_error(wire));
            self.state = GameState::Playing;
            return Err(GameError::InvalidWire(wire));
        }

        if self.roster[holder].defuse_attempt {
            self.announce(&text::defuse_tried(&display));
            self.state = GameState::Playing;
            return Err(GameError::DefuseAlreadyAttempted);
        }

        self.roster[holder].defuse_attempt = true;
        if let Some(turn) = self.turn {
            self.turns[turn].defuse_attempt = true;
        }

        let function = self
            .bomb
            .as_mut()
            .and_then(|bomb| bomb.cut(usize::from(wire - 1)))
            .ok_or(GameError::InvalidWire(wire))?;

        self.state = GameState::Playing;
        self.events.push_back(GameEvent::WireCut {
            nick: display.clone(),
            wire,
            function,
        });
        debug!("{display} cut wire {wire}: {function}");

        match function {
            WireFunction::Success => {
                if let Some(bomb) = self.bomb.as_mut() {
                    bomb.defused = true;
                }
                self.roster[holder].defused = true;
                self.announce(&text::defuse_success(&display));
                self.events.push_back(GameEvent::Defused(display));
                self.stop()?;
            }
            WireFunction::Nothing => self.announce(&text::defuse_nothing(&display)),
            WireFunction::LessTime => {
                if let Some(bomb) = self.bomb.as_mut() {
                    bomb.randomize_fuse(
                        &mut self.rng,
                        Duration::from_secs(LESS_TIME_MIN_SECS),
                        Duration::from_secs(LESS_TIME_MAX_SECS),
                    );
                }
                self.announce(text::DEFUSE_LESS_TIME);
            }
            WireFunction::MoreTime => {
                if let Some(bomb) = self.bomb.as_mut() {
                    let remaining = bomb.remaining(Instant::now());
                    bomb.randomize_fuse(
                        &mut self.rng,
                        remaining,
                        remaining + Duration::from_secs(MORE_TIME_EXTRA_SECS),
                    );
                }
                self.announce(text::DEFUSE_MORE_TIME);
            }
            WireFunction::Explode => self.stop()?,
            WireFunction::Cut => self.announce(text::DEFUSE_DUPLICATE),
        }

        Ok(function)
    }

    /// Detonates the bomb if its fuse is due at `now`. Returns whether the
    /// game ended because of it.
    pub fn check_fuse(&mut self, now: Instant) -> bool {
        if !matches!(self.state, GameState::Playing | GameState::Defuse) {
            return false;
        }

        let due = self.bomb.as_ref().is_some_and(|bomb| bomb.is_due(now));
        due && self.stop().is_ok()
    }

    /// Ends the game. Unless the bomb was defused, whoever holds it pays for
    /// it: fake bombs only embarrass, real ones kick (and ban) if the bot is
    /// allowed to. A bomb lying on the ground hurts nobody.
    pub fn stop(&mut self) -> Result<(), GameError> {
        if !matches!(self.state, GameState::Playing | GameState::Defuse) {
            return Err(GameError::InvalidState(self.state));
        }

        self.ended = Some(Utc::now());
        self.state = GameState::Ended;
        self.close_turn(None);

        let (defused, fake, location) = match self.bomb.as_ref() {
            Some(bomb) => (bomb.defused, bomb.fake, bomb.location),
            None => (false, false, None),
        };

        if !defused {
            match location {
                None => {
                    self.announce(text::BOMB_EXPLODE);
                    self.events.push_back(GameEvent::Detonated { holder: None, fake });
                }
                Some(id) => {
                    let nick = self.roster[id].nick.clone();
                    if fake {
                        self.announce(text::BOMB_FAKE);
                    } else {
                        self.roster[id].dead = true;
                        self.punish(&nick);
                    }
                    self.events.push_back(GameEvent::Detonated {
                        holder: Some(nick),
                        fake,
                    });
                }
            }
        }

        self.events.push_back(GameEvent::Ended);
        info!(
            "Game ended after {} turn(s), defused: {defused}, fake: {fake}",
            self.turns.len()
        );

        Ok(())
    }

    /// Removes a participant. A holder who leaves drops the bomb first.
    pub fn leave(&mut self, nick: &str) -> Result<(), GameError> {
        if !self.is_active() {
            return Err(GameError::InvalidState(self.state));
        }

        let id = self.player_id(nick)?;
        let display = self.roster[id].nick.clone();

        let holding = self.bomb.as_ref().and_then(|bomb| bomb.location) == Some(id);
        if holding && matches!(self.state, GameState::Playing | GameState::Defuse) {
            self.pass_bomb(None, id);
            self.state = GameState::Playing;
            self.announce(&text::bomb_abandoned(&display));
            self.events.push_back(GameEvent::Dropped {
                by: display.clone(),
            });
        }

        let key = self.roster[id].key.clone();
        self.players.remove(&key);

        self.announce(&text::player_left(&display));
        self.events.push_back(GameEvent::Left(display));

        Ok(())
    }

    /// Follows a participant's nickname change.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), GameError> {
        if !self.is_active() {
            return Err(GameError::InvalidState(self.state));
        }

        let id = self.player_id(old)?;
        let old_key = self.roster[id].key.clone();
        let new_key = Nickname::new(new);

        if new_key != old_key && self.players.contains_key(&new_key) {
            return Err(GameError::NicknameTaken(new.trim().to_string()));
        }

        let old_nick = std::mem::replace(&mut self.roster[id].nick, new.trim().to_string());
        self.roster[id].key = new_key.clone();
        self.players.remove(&old_key);
        self.players.insert(new_key, id);

        let new_nick = self.roster[id].nick.clone();
        self.announce(&text::player_renamed(&old_nick, &new_nick));
        self.events.push_back(GameEvent::Renamed {
            from: old_nick,
            to: new_nick,
        });

        Ok(())
    }

    /// Broadcasts the current participants and returns their nicknames.
    pub fn player_list(&self) -> Result<Vec<String>, GameError> {
        if !self.is_active() {
            return Err(GameError::InvalidState(self.state));
        }

        let nicks: Vec<String> = self.participants().map(|p| p.nick.clone()).collect();
        self.announce(&text::player_list(&nicks.join(", ")));

        Ok(nicks)
    }

    fn check_can_start(&self) -> Result<(), GameError> {
        if self.is_active() {
            return Err(GameError::AlreadyActive);
        }
        if self.chat.is_none() {
            return Err(GameError::ChatUnbound);
        }
        self.config.validate().map_err(GameError::InvalidConfig)
    }

    fn begin_warmup(&mut self, bomb: Bomb) {
        self.reset();
        self.bomb = Some(bomb);
        self.started = Some(Utc::now());
        self.state = GameState::Warmup;

        self.announce(text::START_ATTENTION);
        self.announce(&text::start_join());
        self.events.push_back(GameEvent::WarmupStarted);
        info!("Warm-up started");
    }

    /// Forgets everything about the previous round.
    fn reset(&mut self) {
        self.state = GameState::Init;
        self.bomb = None;
        self.roster.clear();
        self.players.clear();
        self.first = None;
        self.turns.clear();
        self.turn = None;
        self.started = None;
        self.ended = None;
    }

    fn announce(&self, message: &str) {
        if let Some(chat) = &self.chat {
            chat.public(message);
        }
    }

    /// Kicks (and maybe bans) the victim of a real detonation.
    fn punish(&mut self, nick: &str) {
        let Some(chat) = self.chat.clone() else {
            return;
        };

        if !self.config.kick_on_explode || !chat.is_operator() {
            chat.public(text::BOMB_EXPLODE);
            chat.public(&text::bomb_explode_noop(nick));
            return;
        }

        if self.config.ban_on_explode && chat.ban(nick) {
            self.events.push_back(GameEvent::Banned {
                nick: nick.to_string(),
                unban_after: self.config.ban_duration(),
            });
        }

        chat.kick(nick, text::BOMB_EXPLODE);
        self.events.push_back(GameEvent::Kicked(nick.to_string()));
    }

    fn earliest_participant(&self) -> Option<PlayerId> {
        self.roster
            .iter()
            .enumerate()
            .find(|(id, player)| self.players.get(&player.key) == Some(id))
            .map(|(id, _)| id)
    }

    fn player_id(&self, nick: &str) -> Result<PlayerId, GameError> {
        self.players
            .get(&Nickname::new(nick))
            .copied()
            .ok_or(GameError::UnknownPlayer)
    }

    fn require_holder(&self, nick: &str) -> Result<PlayerId, GameError> {
        let key = Nickname::new(nick);
        self.bomb
            .as_ref()
            .and_then(|bomb| bomb.location)
            .filter(|&id| self.roster[id].key == key)
            .ok_or(GameError::NotHolder)
    }

    /// Closes the open turn and, if there is a `next` holder, opens theirs.
    /// `None` leaves the bomb on the ground.
    fn pass_bomb(&mut self, next: Option<PlayerId>, from: PlayerId) {
        self.close_turn(next);
        match next {
            Some(next) => self.open_turn(next, Some(from)),
            None => {
                if let Some(bomb) = self.bomb.as_mut() {
                    bomb.location = None;
                }
            }
        }
    }

    fn open_turn(&mut self, holder: PlayerId, source: Option<PlayerId>) {
        let id = self.turns.len();
        self.turns.push(Turn::open(holder, source));
        self.roster[holder].turns.push(id);
        self.turn = Some(id);
        if let Some(bomb) = self.bomb.as_mut() {
            bomb.location = Some(holder);
        }
    }

    fn close_turn(&mut self, target: Option<PlayerId>) {
        if let Some(id) = self.turn.take() {
            self.turns[id].close(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatCall, TranscriptChat};

    fn game_with(chat: &Arc<TranscriptChat>) -> Game {
        let config = GameConfig {
            min_players: 2,
            ..GameConfig::default()
        };
        Game::with_chat(config, chat.clone())
    }

    fn playing(chat: &Arc<TranscriptChat>, wires: Vec<WireFunction>) -> Game {
        let mut game = game_with(chat);
        game.start_with(Bomb::new(false, true, wires)).unwrap();
        game.join("Alice").unwrap();
        game.join("Bob").unwrap();
        game.finish_warmup().unwrap();
        game
    }

    #[test]
    fn test_start_without_chat_is_rejected() {
        let mut game = Game::new(GameConfig::default());
        assert_eq!(game.start(), Err(GameError::ChatUnbound));
        assert_eq!(game.state(), GameState::Init);
        assert!(game.bomb().is_none());
    }

    #[test]
    fn test_start_with_invalid_config_is_rejected() {
        let chat = Arc::new(TranscriptChat::new(true));
        let config = GameConfig {
            min_wires: 8,
            max_wires: 4,
            ..GameConfig::default()
        };
        let mut game = Game::with_chat(config, chat.clone());

        assert!(matches!(game.start(), Err(GameError::InvalidConfig(_))));
        assert_eq!(game.state(), GameState::Init);
        assert!(game.bomb().is_none());
        assert!(chat.calls().is_empty());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = game_with(&chat);
        game.start().unwrap();
        assert_eq!(game.start(), Err(GameError::AlreadyActive));
    }

    #[test]
    fn test_join_sends_private_welcome() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = game_with(&chat);
        game.start().unwrap();
        game.join(" Alice ").unwrap();

        assert!(chat.calls().contains(&ChatCall::Private {
            nick: "Alice".to_string(),
            message: text::PLAYER_JOINED.to_string(),
        }));
        assert_eq!(game.join("ALICE"), Err(GameError::AlreadyJoined));
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn test_first_participant_gets_the_bomb() {
        let chat = Arc::new(TranscriptChat::new(true));
        let game = playing(&chat, vec![WireFunction::Nothing]);

        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.holder().map(Player::nick), Some("Alice"));
        assert_eq!(game.turns().len(), 1);
        assert!(game.current_turn().unwrap().source().is_none());
    }

    #[test]
    fn test_first_falls_back_when_earliest_leaves() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = game_with(&chat);
        game.start().unwrap();
        game.join("Alice").unwrap();
        game.join("Bob").unwrap();
        game.join("Carol").unwrap();
        game.leave("alice").unwrap();
        game.finish_warmup().unwrap();

        assert_eq!(game.first().map(Player::nick), Some("Bob"));
        assert_eq!(game.holder().map(Player::nick), Some("Bob"));
    }

    #[test]
    fn test_throw_to_self_changes_nothing() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        assert_eq!(game.throw("alice", " ALICE"), Err(GameError::ThrowToSelf));
        assert_eq!(game.turns().len(), 1);
        assert!(game.current_turn().unwrap().is_open());
    }

    #[test]
    fn test_only_holder_may_throw() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        assert_eq!(game.throw("bob", "alice"), Err(GameError::NotHolder));
        assert_eq!(game.throw("alice", "bob"), Ok(ThrowOutcome::Passed));
        assert_eq!(game.holder().map(Player::nick), Some("Bob"));
    }

    #[test]
    fn test_defuse_moves_to_defuse_state_and_blocks_throws() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing, WireFunction::Nothing]);

        game.defuse("alice").unwrap();
        assert_eq!(game.state(), GameState::Defuse);
        assert_eq!(
            game.throw("alice", "bob"),
            Err(GameError::InvalidState(GameState::Defuse))
        );

        assert_eq!(game.cut("alice", 2), Ok(WireFunction::Nothing));
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.bomb().unwrap().wires()[1], WireFunction::Cut);
    }

    #[test]
    fn test_defuse_on_undefusable_bomb() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = game_with(&chat);
        game.start_with(Bomb::new(false, false, vec![WireFunction::Success]))
            .unwrap();
        game.join("Alice").unwrap();
        game.join("Bob").unwrap();
        game.finish_warmup().unwrap();

        assert_eq!(game.defuse("alice"), Err(GameError::NotDefusable));
        assert_eq!(game.cut("alice", 1), Err(GameError::NotDefusable));
        assert_eq!(game.state(), GameState::Playing);
        assert!(!game.player("alice").unwrap().defuse_attempted());
    }

    #[test]
    fn test_less_time_wire_shortens_fuse() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::LessTime]);

        game.cut("alice", 1).unwrap();
        let remaining = game.bomb().unwrap().remaining(Instant::now());
        assert!(remaining <= Duration::from_secs(LESS_TIME_MAX_SECS));
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_more_time_wire_never_shortens_fuse() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::MoreTime]);

        let before = game.bomb().unwrap().detonation();
        game.cut("alice", 1).unwrap();
        let after = game.bomb().unwrap().detonation();

        assert!(after + Duration::from_millis(5) >= before);
        assert!(after <= before + Duration::from_secs(MORE_TIME_EXTRA_SECS + 1));
    }

    #[test]
    fn test_check_fuse_before_deadline_keeps_playing() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        assert!(!game.check_fuse(Instant::now()));
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        game.stop().unwrap();
        let calls = chat.calls().len();
        assert_eq!(game.stop(), Err(GameError::InvalidState(GameState::Ended)));
        assert!(!game.check_fuse(Instant::now() + Duration::from_secs(3600)));
        assert_eq!(chat.calls().len(), calls);
    }

    #[test]
    fn test_rename_rekeys_player() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        game.rename("alice", "Alicia").unwrap();
        assert!(game.player("alice").is_none());
        assert_eq!(game.holder().map(Player::nick), Some("Alicia"));
        assert_eq!(game.throw("alicia", "bob"), Ok(ThrowOutcome::Passed));

        assert_eq!(
            game.rename("bob", "ALICIA"),
            Err(GameError::NicknameTaken("ALICIA".to_string()))
        );
    }

    #[test]
    fn test_events_are_drained() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = playing(&chat, vec![WireFunction::Nothing]);

        let events = game.drain_events();
        assert_eq!(events.front(), Some(&GameEvent::WarmupStarted));
        assert!(events.contains(&GameEvent::PlayStarted {
            first: "Alice".to_string()
        }));
        assert!(game.drain_events().is_empty());

        game.throw("alice", "bob").unwrap();
        assert!(!game.drain_events().is_empty());
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_rejoin_while_playing_counts_as_late() {
        let chat = Arc::new(TranscriptChat::new(true));
        let mut game = game_with(&chat);
        game.start_with(Bomb::new(false, true, vec![WireFunction::Nothing]))
            .unwrap();
        for nick in ["Alice", "Bob", "Carol"] {
            game.join(nick).unwrap();
        }
        game.leave("carol").unwrap();
        game.finish_warmup().unwrap();
        game.drain_events();

        game.join("Carol").unwrap();
        assert!(game.player("carol").is_some_and(Player::is_late));
        assert_eq!(game.roster().len(), 3);
        assert!(game.drain_events().contains(&GameEvent::Joined {
            nick: "Carol".to_string(),
            late: true,
        }));
    }
}
