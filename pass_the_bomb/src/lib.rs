//! # Pass the Bomb
//!
//! Rules engine for a chat party game: a virtual time bomb is handed from
//! player to player until its hidden fuse runs out, and whoever holds it
//! when it goes off is kicked from the channel.
//!
//! The core game is a synchronous state machine driven through five phases:
//!
//! - **Init**: No game running
//! - **Warmup**: Join window open while the rules are explained
//! - **Playing**: Bomb is being passed around
//! - **Defuse**: Holder is picking a wire to cut
//! - **Ended**: Bomb went off, fizzled or was defused
//!
//! ## Core Modules
//!
//! - [`game`]: State machine, entities and announcements
//! - [`chat`]: The chat-platform seam the game talks through
//! - [`session`]: Async actor that owns a game and runs its timers
//! - [`command`]: Parsing of `!`-prefixed chat commands
//! - [`score`]: Per-player statistics and scoring modes
//! - [`export`]: JSON snapshots of finished games
//!
//! ## Example
//!
//! ```
//! use pass_the_bomb::{Game, GameConfig, GameState, TranscriptChat};
//! use std::sync::Arc;
//!
//! let chat = Arc::new(TranscriptChat::new(true));
//! let mut game = Game::with_chat(GameConfig::default(), chat);
//! game.start().unwrap();
//! assert_eq!(game.state(), GameState::Warmup);
//! ```

/// Chat-platform abstraction.
pub mod chat;
pub use chat::{Chat, ChatCall, TranscriptChat};

/// Chat command parsing.
pub mod command;
pub use command::Command;

/// Game export and import.
pub mod export;
pub use export::{GameExport, TurnRecord};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Bomb, Game, GameConfig, GameError, GameEvent, GameState, Nickname, Player, PlayerId,
    ThrowOutcome, Turn, TurnId, WireFunction, constants,
};

/// Statistics and scoring.
pub mod score;
pub use score::{PlayerStats, ScoreBoard, ScoreCalc, ScoreCard, ScoreMode};

/// Async game sessions.
pub mod session;
pub use session::{GameHandle, Warmup};
