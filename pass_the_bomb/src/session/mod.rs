//! Game session: an async actor that owns one [`Game`](crate::game::Game).
//!
//! This module implements:
//! - GameActor: task that applies every operation to the game one at a time
//! - GameHandle: cloneable front door with one async method per operation
//! - Timers: warm-up broadcasts, the fuse watchdog and delayed unbans
//!
//! ## Architecture
//!
//! The game runs in its own Tokio task with an mpsc message inbox. Player
//! actions, warm-up ticks and watchdog wake-ups all arrive as messages, so a
//! throw can never interleave with a detonation check.
//!
//! ## Example
//!
//! ```no_run
//! use pass_the_bomb::{Game, GameConfig, TranscriptChat, session::GameHandle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let chat = Arc::new(TranscriptChat::new(true));
//!     let handle = GameHandle::spawn(Game::with_chat(GameConfig::default(), chat));
//!
//!     let warmup = handle.start_warmup().await.unwrap();
//!     for nick in ["alice", "bob", "carol", "dave"] {
//!         handle.join(nick).await.unwrap();
//!     }
//!     warmup.finished().await.unwrap();
//! }
//! ```

pub mod actor;
pub mod messages;

pub use actor::{GameActor, GameHandle, Warmup};
pub use messages::{GameMessage, Reply};
