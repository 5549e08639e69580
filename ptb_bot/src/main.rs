//! Pass-the-bomb host running in a terminal.
//!
//! Reads chat lines from stdin, feeds player commands to a single game
//! session and prints everything the game says to stdout.

mod config;
mod console;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{debug, info, warn};
use pass_the_bomb::{Command, Game, GameHandle, GameState, ScoreMode};
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

use config::{BotConfig, Overrides};
use console::{Admin, ConsoleChat, Line};

const HELP: &str = "\
Host a pass-the-bomb game in the terminal

USAGE:
  ptb_bot [OPTIONS]

OPTIONS:
  --score      MODE        Leaderboard scoring: duration, mean, defuse, complex  [default: env PTB_SCORE_MODE or complex]
  --export     DIR         Write each finished game as JSON into DIR  [default: env PTB_EXPORT_DIR]

FLAGS:
  --no-op                  Run without kick/ban privilege
  -h, --help               Print help information

INPUT:
  <nick>: <message>        Somebody talks in the room (e.g. alice: !join)
  /start /stop /players /scores /export /quit
  /leave <nick>  /rename <old> <new>

ENVIRONMENT:
  PTB_MIN_PLAYERS, PTB_JOIN_WINDOW_SECS, PTB_MIN_FUSE_SECS, PTB_MAX_FUSE_SECS, ...
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        operator: pargs.contains("--no-op").then_some(false),
        score_mode: pargs.opt_value_from_str::<_, ScoreMode>("--score")?,
        export_dir: pargs.opt_value_from_str::<_, PathBuf>("--export")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = BotConfig::from_env(overrides)?;
    config.validate()?;
    info!(
        "Starting pass-the-bomb host (operator: {}, scoring: {})",
        config.operator, config.score_mode
    );

    let chat = Arc::new(ConsoleChat::new(config.operator));
    let handle = GameHandle::spawn(Game::with_chat(config.game.clone(), chat.clone()));
    tokio::spawn(report_finished_games(handle.clone(), config.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Line::parse(&line) {
            Ok(Line::Say { nick, message }) => {
                if chat.is_banned(&nick) {
                    println!("*** {nick} is banned and can't talk right now");
                    continue;
                }
                let Some(command) = Command::parse(&message) else {
                    continue;
                };
                if let Err(e) = handle.dispatch(&nick, command).await {
                    debug!("{nick}: {e}");
                }
            }
            Ok(Line::Admin(Admin::Quit)) => break,
            Ok(Line::Admin(admin)) => run_admin(&handle, &config, admin).await,
            Err(console::LineError::Empty) => {}
            Err(e) => println!("*** {e}"),
        }
    }

    handle.close().await?;
    info!("Shutting down");

    Ok(())
}

async fn run_admin(handle: &GameHandle, config: &BotConfig, admin: Admin) {
    let result: Result<(), Error> = match admin {
        Admin::Start => start(handle).await,
        Admin::Stop => handle.stop().await.map_err(Error::from),
        Admin::Leave(nick) => handle.leave(&nick).await.map_err(Error::from),
        Admin::Rename { old, new } => handle.rename(&old, &new).await.map_err(Error::from),
        Admin::Players => handle.player_list().await.map(|_| ()).map_err(Error::from),
        Admin::Scores => print_scores(handle, config.score_mode).await,
        Admin::Export => match &config.export_dir {
            Some(dir) => write_export(handle, dir).await,
            None => print_export(handle).await,
        },
        Admin::Quit => Ok(()),
    };

    if let Err(e) = result {
        println!("*** {e:#}");
    }
}

/// Opens the join window and leaves the rest of the warm-up running in the
/// background, so the room can keep talking.
async fn start(handle: &GameHandle) -> Result<(), Error> {
    let warmup = handle.start_warmup().await?;
    tokio::spawn(async move {
        if let Err(e) = warmup.finished().await {
            println!("*** No game: {e}");
        }
    });
    Ok(())
}

/// Prints the leaderboard, and writes the export if configured, every time a
/// game ends.
async fn report_finished_games(handle: GameHandle, config: BotConfig) {
    let mut state = handle.watch_state();

    while state.changed().await.is_ok() {
        if *state.borrow_and_update() != GameState::Ended {
            continue;
        }

        if let Err(e) = print_scores(&handle, config.score_mode).await {
            warn!("Could not score the game: {e}");
        }

        if let Some(dir) = &config.export_dir
            && let Err(e) = write_export(&handle, dir).await
        {
            warn!("Could not export the game: {e:#}");
        }
    }
}

async fn print_scores(handle: &GameHandle, mode: ScoreMode) -> Result<(), Error> {
    let board = handle.scores(mode.calc()).await?;

    println!("=== Scores ({mode}) ===");
    for (rank, card) in board.leaderboard().iter().enumerate() {
        println!("{:>2}. {:<16} {}", rank + 1, card.nick, card.score);
    }

    Ok(())
}

async fn print_export(handle: &GameHandle) -> Result<(), Error> {
    println!("{}", handle.export().await?.to_json()?);
    Ok(())
}

async fn write_export(handle: &GameHandle, dir: &std::path::Path) -> Result<(), Error> {
    let export = handle.export().await?;
    let stamp = export.started.unwrap_or_else(chrono::Utc::now);
    let path = dir.join(format!("game-{}.json", stamp.format("%Y%m%d-%H%M%S")));

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    tokio::fs::write(&path, export.to_json()?)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    info!("Exported game to {}", path.display());
    Ok(())
}
