//! Pass-the-bomb game engine - state machine and game entities.
//!
//! This module provides the round itself:
//! - The bomb (fuse, wires, holder)
//! - Players and the turn log
//! - The state machine driving warm-up, passing, defusing and detonation
//! - Announcement texts and tunables

pub mod config;
pub mod constants;
pub mod entities;
pub mod state_machine;
pub mod text;

pub use config::GameConfig;
pub use entities::{Bomb, Nickname, Player, PlayerId, Turn, TurnId, WireFunction};
pub use state_machine::{Game, GameError, GameEvent, GameState, ThrowOutcome};
