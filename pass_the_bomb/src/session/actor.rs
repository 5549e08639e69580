//! Game actor implementation with async message handling.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, interval_at, sleep},
};

use super::messages::{GameMessage, Reply};
use crate::{
    command::Command,
    export::GameExport,
    game::{
        Game, GameError, GameEvent, GameState, ThrowOutcome, WireFunction,
        constants::EXPLAIN_TICKS,
    },
    score::{ScoreBoard, ScoreCalc},
};

/// Game handle for sending messages
#[derive(Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    state: watch::Receiver<GameState>,
}

/// Pending join window, returned by [`GameHandle::start_warmup`]
#[derive(Debug)]
pub struct Warmup {
    finished: oneshot::Receiver<Result<(), GameError>>,
}

impl Warmup {
    /// Waits for the join window to close. Ok means the bomb is live.
    pub async fn finished(self) -> Result<(), GameError> {
        self.finished.await.map_err(|_| GameError::SessionClosed)?
    }
}

impl GameHandle {
    /// Spawn an actor for `game` and return its handle
    pub fn spawn(game: Game) -> Self {
        let (actor, handle) = GameActor::new(game);
        tokio::spawn(actor.run());
        handle
    }

    /// Current state, as last published by the actor
    pub fn state(&self) -> GameState {
        *self.state.borrow()
    }

    /// Subscribe to state changes
    pub fn watch_state(&self) -> watch::Receiver<GameState> {
        self.state.clone()
    }

    /// Wait until the game reaches `target`
    pub async fn wait_for_state(&self, target: GameState) -> Result<(), GameError> {
        let mut state = self.state.clone();
        state
            .wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| GameError::SessionClosed)
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(Reply<T>) -> GameMessage,
    ) -> Result<T, GameError> {
        let (response, reply) = oneshot::channel();
        self.sender
            .send(message(response))
            .await
            .map_err(|_| GameError::SessionClosed)?;
        reply.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Open the join window and return as soon as players can join
    pub async fn start_warmup(&self) -> Result<Warmup, GameError> {
        let (finished, finished_rx) = oneshot::channel();
        self.request(|accepted| GameMessage::Start { accepted, finished })
            .await?;
        Ok(Warmup {
            finished: finished_rx,
        })
    }

    /// Open the join window and wait for it to close
    pub async fn start(&self) -> Result<(), GameError> {
        self.start_warmup().await?.finished().await
    }

    pub async fn join(&self, nick: &str) -> Result<(), GameError> {
        let nick = nick.to_string();
        self.request(|response| GameMessage::Join { nick, response })
            .await
    }

    pub async fn throw(&self, source: &str, target: &str) -> Result<ThrowOutcome, GameError> {
        let (source, target) = (source.to_string(), target.to_string());
        self.request(|response| GameMessage::Throw {
            source,
            target,
            response,
        })
        .await
    }

    pub async fn pickup(&self, nick: &str) -> Result<(), GameError> {
        let nick = nick.to_string();
        self.request(|response| GameMessage::Pickup { nick, response })
            .await
    }

    pub async fn defuse(&self, nick: &str) -> Result<(), GameError> {
        let nick = nick.to_string();
        self.request(|response| GameMessage::Defuse { nick, response })
            .await
    }

    pub async fn cut(&self, nick: &str, wire: u8) -> Result<WireFunction, GameError> {
        let nick = nick.to_string();
        self.request(|response| GameMessage::Cut {
            nick,
            wire,
            response,
        })
        .await
    }

    pub async fn stop(&self) -> Result<(), GameError> {
        self.request(|response| GameMessage::Stop { response })
            .await
    }

    pub async fn leave(&self, nick: &str) -> Result<(), GameError> {
        let nick = nick.to_string();
        self.request(|response| GameMessage::Leave { nick, response })
            .await
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<(), GameError> {
        let (old, new) = (old.to_string(), new.to_string());
        self.request(|response| GameMessage::Rename { old, new, response })
            .await
    }

    pub async fn player_list(&self) -> Result<Vec<String>, GameError> {
        self.request(|response| GameMessage::PlayerList { response })
            .await
    }

    pub async fn export(&self) -> Result<GameExport, GameError> {
        let (response, reply) = oneshot::channel();
        self.sender
            .send(GameMessage::Export { response })
            .await
            .map_err(|_| GameError::SessionClosed)?;
        reply.await.map_err(|_| GameError::SessionClosed)
    }

    pub async fn scores(&self, calc: ScoreCalc) -> Result<ScoreBoard, GameError> {
        let (response, reply) = oneshot::channel();
        self.sender
            .send(GameMessage::Scores { calc, response })
            .await
            .map_err(|_| GameError::SessionClosed)?;
        reply.await.map_err(|_| GameError::SessionClosed)
    }

    /// Shut the actor down. Pending warm-ups resolve with `SessionClosed`.
    pub async fn close(&self) -> Result<(), GameError> {
        let (response, reply) = oneshot::channel();
        self.sender
            .send(GameMessage::Close { response })
            .await
            .map_err(|_| GameError::SessionClosed)?;
        reply.await.map_err(|_| GameError::SessionClosed)
    }

    /// Route a parsed chat command from `sender` to the game
    pub async fn dispatch(&self, sender: &str, command: Command) -> Result<(), GameError> {
        match command {
            Command::Join => self.join(sender).await,
            Command::Pass(target) => self.throw(sender, &target).await.map(|_| ()),
            Command::Defuse => self.defuse(sender).await,
            Command::Cut(wire) => self.cut(sender, wire).await.map(|_| ()),
            Command::Players => self.player_list().await.map(|_| ()),
            Command::Pickup => self.pickup(sender).await,
        }
    }
}

/// Game actor owning a single game
pub struct GameActor {
    game: Game,

    /// Message inbox
    inbox: mpsc::Receiver<GameMessage>,

    /// Lets timers post back without keeping the inbox open forever
    sender: mpsc::WeakSender<GameMessage>,

    /// Published state
    state: watch::Sender<GameState>,

    /// Caller waiting for the join window to close
    pending_start: Option<Reply<()>>,

    /// Stop signal for the running watchdog
    watchdog: Option<oneshot::Sender<()>>,

    is_closed: bool,
}

impl GameActor {
    /// Create a new game actor
    ///
    /// # Returns
    ///
    /// * `(GameActor, GameHandle)` - Actor and handle for sending messages
    pub fn new(game: Game) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let (state, state_rx) = watch::channel(game.state());

        let actor = Self {
            game,
            inbox,
            sender: sender.downgrade(),
            state,
            pending_start: None,
            watchdog: None,
            is_closed: false,
        };

        let handle = GameHandle {
            sender,
            state: state_rx,
        };

        (actor, handle)
    }

    /// Run the game actor event loop
    pub async fn run(mut self) {
        info!("Game session starting");

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            self.process_events();

            if self.is_closed {
                break;
            }
        }

        self.stop_watchdog();
        info!("Game session closed");
    }

    /// Handle a game message
    fn handle_message(&mut self, message: GameMessage) {
        match message {
            GameMessage::Start { accepted, finished } => {
                let result = self.game.start();
                if result.is_ok() {
                    self.pending_start = Some(finished);
                    self.schedule_warmup();
                }
                self.reply(accepted, result);
            }

            GameMessage::Join { nick, response } => {
                let result = self.game.join(&nick);
                self.reply(response, result);
            }

            GameMessage::Throw {
                source,
                target,
                response,
            } => {
                let result = self.game.throw(&source, &target);
                self.reply(response, result);
            }

            GameMessage::Pickup { nick, response } => {
                let result = self.game.pickup(&nick);
                self.reply(response, result);
            }

            GameMessage::Defuse { nick, response } => {
                let result = self.game.defuse(&nick);
                self.reply(response, result);
            }

            GameMessage::Cut {
                nick,
                wire,
                response,
            } => {
                let result = self.game.cut(&nick, wire);
                self.reply(response, result);
            }

            GameMessage::Stop { response } => {
                let result = self.game.stop();
                self.reply(response, result);
            }

            GameMessage::Leave { nick, response } => {
                let result = self.game.leave(&nick);
                self.reply(response, result);
            }

            GameMessage::Rename { old, new, response } => {
                let result = self.game.rename(&old, &new);
                self.reply(response, result);
            }

            GameMessage::PlayerList { response } => {
                let result = self.game.player_list();
                self.reply(response, result);
            }

            GameMessage::Export { response } => {
                let _ = response.send(GameExport::from_game(&self.game));
            }

            GameMessage::Scores { calc, response } => {
                let _ = response.send(ScoreBoard::for_game(&self.game, calc));
            }

            GameMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }

            GameMessage::Explain { tick } => {
                if let Err(e) = self.game.explain(tick) {
                    debug!("Skipping warm-up tick {tick}: {e}");
                }
            }

            GameMessage::WarmupElapsed => {
                let result = self.game.finish_warmup();
                if result.is_ok() {
                    self.spawn_watchdog();
                }
                if let Some(finished) = self.pending_start.take() {
                    self.reply(finished, result);
                }
            }

            GameMessage::FuseCheck => {
                if self.game.check_fuse(Instant::now()) {
                    info!("Fuse burned down");
                }
            }
        }
    }

    /// Settles the game's side effects, then answers the caller, so the
    /// published state is current by the time the reply lands.
    fn reply<T>(&mut self, response: Reply<T>, result: Result<T, GameError>) {
        self.process_events();
        if response.send(result).is_err() {
            warn!("Caller went away before the game replied");
        }
    }

    /// Drain game events, log them and run their side effects
    fn process_events(&mut self) {
        for event in self.game.drain_events() {
            debug!("Game event: {event}");

            match event {
                GameEvent::Banned { nick, unban_after } => self.schedule_unban(nick, unban_after),
                GameEvent::Ended => self.stop_watchdog(),
                _ => {}
            }
        }

        let current = self.game.state();
        self.state.send_if_modified(|state| {
            let changed = *state != current;
            *state = current;
            changed
        });
    }

    /// Post the warm-up broadcasts and the end of the join window, evenly
    /// spread over the window.
    fn schedule_warmup(&self) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let step = self.game.config().explain_interval();

        tokio::spawn(async move {
            for tick in 1..=EXPLAIN_TICKS {
                sleep(step).await;
                if sender.send(GameMessage::Explain { tick }).await.is_err() {
                    return;
                }
            }
            sleep(step).await;
            let _ = sender.send(GameMessage::WarmupElapsed).await;
        });
    }

    fn spawn_watchdog(&mut self) {
        self.stop_watchdog();

        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let period = self.game.config().fuse_check_interval();
        let (stop, mut stopped) = oneshot::channel();
        self.watchdog = Some(stop);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if sender.send(GameMessage::FuseCheck).await.is_err() {
                            break;
                        }
                    }
                    _ = &mut stopped => break,
                }
            }
            debug!("Watchdog stopped");
        });
    }

    fn stop_watchdog(&mut self) {
        if let Some(stop) = self.watchdog.take() {
            let _ = stop.send(());
        }
    }

    /// Fire-and-forget: the unban happens after `after` no matter what the
    /// session does in between.
    fn schedule_unban(&self, nick: String, after: Duration) {
        let Some(chat) = self.game.chat().cloned() else {
            return;
        };

        tokio::spawn(async move {
            sleep(after).await;
            chat.unban(&nick);
            info!("Unbanned {nick}");
        });
    }
}
