//! Game session message types.

use tokio::sync::oneshot;

use crate::{
    export::GameExport,
    game::{GameError, ThrowOutcome, WireFunction},
    score::{ScoreBoard, ScoreCalc},
};

/// Reply channel for an operation on the game
pub type Reply<T> = oneshot::Sender<Result<T, GameError>>;

/// Messages that can be sent to a GameActor
#[derive(Debug)]
pub enum GameMessage {
    /// Open the join window. `accepted` answers right away, `finished` once
    /// the window has closed.
    Start {
        accepted: Reply<()>,
        finished: Reply<()>,
    },

    Join {
        nick: String,
        response: Reply<()>,
    },

    Throw {
        source: String,
        target: String,
        response: Reply<ThrowOutcome>,
    },

    Pickup {
        nick: String,
        response: Reply<()>,
    },

    Defuse {
        nick: String,
        response: Reply<()>,
    },

    /// Cut a wire, numbered from 1
    Cut {
        nick: String,
        wire: u8,
        response: Reply<WireFunction>,
    },

    Stop {
        response: Reply<()>,
    },

    Leave {
        nick: String,
        response: Reply<()>,
    },

    Rename {
        old: String,
        new: String,
        response: Reply<()>,
    },

    PlayerList {
        response: Reply<Vec<String>>,
    },

    /// Snapshot the game for statistics
    Export {
        response: oneshot::Sender<GameExport>,
    },

    /// Score every current participant
    Scores {
        calc: ScoreCalc,
        response: oneshot::Sender<ScoreBoard>,
    },

    /// Shut the session down
    Close {
        response: oneshot::Sender<()>,
    },

    /// Internal: warm-up broadcast number `tick` is due
    Explain { tick: u8 },

    /// Internal: the join window has closed
    WarmupElapsed,

    /// Internal: watchdog wake-up
    FuseCheck,
}
