/// Integration tests for the async game session
///
/// The clock is paused, so the join window, the watchdog and the unban
/// timer all run in virtual time.
use std::{sync::Arc, time::Duration};

use pass_the_bomb::{
    ChatCall, Command, Game, GameConfig, GameError, GameState, ScoreMode, ThrowOutcome,
    TranscriptChat, game::text, session::GameHandle,
};
use tokio::time::{Instant, sleep};

fn fixed_fuse_config() -> GameConfig {
    GameConfig {
        min_players: 2,
        min_fuse_secs: 30,
        max_fuse_secs: 30,
        fake_enabled: false,
        defuse_enabled: false,
        ..GameConfig::default()
    }
}

fn spawn(config: GameConfig, chat: &Arc<TranscriptChat>) -> GameHandle {
    GameHandle::spawn(Game::with_chat(config, chat.clone()))
}

async fn start_with_players(handle: &GameHandle, nicks: &[&str]) {
    let warmup = handle.start_warmup().await.unwrap();
    for nick in nicks {
        handle.join(nick).await.unwrap();
    }
    warmup.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_warmup_explains_then_starts_play() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(GameConfig::default(), &chat);
    let begin = Instant::now();

    let warmup = handle.start_warmup().await.unwrap();
    assert_eq!(handle.state(), GameState::Warmup);
    for nick in ["alice", "bob", "carol", "dave"] {
        handle.join(nick).await.unwrap();
    }
    warmup.finished().await.unwrap();

    assert_eq!(handle.state(), GameState::Playing);
    assert!(begin.elapsed() >= Duration::from_secs(30));
    assert!(begin.elapsed() < Duration::from_secs(31));

    let messages = chat.public_messages();
    let position = |message: &str| messages.iter().position(|m| m == message).unwrap();
    assert!(position(&text::help_throw()) < position(text::HELP_SCORE));
    assert!(position(text::HELP_SCORE) < position(&text::help_defuse()));
    assert!(position(&text::help_defuse()) < position(&text::help_start("alice")));
    assert!(position(&text::help_start("alice")) < position(&text::start_go("alice")));
}

#[tokio::test(start_paused = true)]
async fn test_warmup_failure_reports_player_count() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(GameConfig::default(), &chat);

    let warmup = handle.start_warmup().await.unwrap();
    handle.join("alice").await.unwrap();

    assert_eq!(
        warmup.finished().await,
        Err(GameError::NotEnoughPlayers {
            joined: 1,
            required: 4
        })
    );
    assert_eq!(handle.state(), GameState::Init);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(GameConfig::default(), &chat);

    let _warmup = handle.start_warmup().await.unwrap();
    assert_eq!(
        handle.start_warmup().await.unwrap_err(),
        GameError::AlreadyActive
    );
}

#[tokio::test]
async fn test_start_without_chat_is_rejected() {
    let handle = GameHandle::spawn(Game::new(GameConfig::default()));
    assert_eq!(handle.start().await, Err(GameError::ChatUnbound));
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_detonates_and_unban_follows() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(fixed_fuse_config(), &chat);

    start_with_players(&handle, &["alice", "bob"]).await;
    assert_eq!(handle.throw("alice", "bob").await, Ok(ThrowOutcome::Passed));

    let lit = Instant::now();
    handle.wait_for_state(GameState::Ended).await.unwrap();
    assert!(lit.elapsed() >= Duration::from_secs(30));
    assert!(lit.elapsed() <= Duration::from_secs(40));

    let export = handle.export().await.unwrap();
    let bob = export.players.iter().find(|p| p.nick == "bob").unwrap();
    assert!(bob.dead);
    assert!(chat.calls().contains(&ChatCall::Ban("bob".to_string())));
    assert!(!chat.calls().contains(&ChatCall::Unban("bob".to_string())));

    sleep(Duration::from_secs(11)).await;
    assert!(chat.calls().contains(&ChatCall::Unban("bob".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_quiet_after_stop() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(fixed_fuse_config(), &chat);

    start_with_players(&handle, &["alice", "bob"]).await;
    handle.throw("alice", "nobody").await.unwrap();
    handle.stop().await.unwrap();
    assert_eq!(handle.state(), GameState::Ended);

    let calls = chat.calls().len();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(chat.calls().len(), calls);
    assert_eq!(handle.stop().await, Err(GameError::InvalidState(GameState::Ended)));
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_routes_chat_commands() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(fixed_fuse_config(), &chat);

    let warmup = handle.start_warmup().await.unwrap();
    for (nick, line) in [("alice", "!join"), ("bob", "!JOIN")] {
        let command = Command::parse(line).unwrap();
        handle.dispatch(nick, command).await.unwrap();
    }
    warmup.finished().await.unwrap();

    let pass = Command::parse("!pass bob").unwrap();
    handle.dispatch("alice", pass).await.unwrap();
    assert_eq!(
        handle.dispatch("alice", Command::Pickup).await,
        Err(GameError::BombNotOnGround)
    );
    assert_eq!(
        handle.dispatch("bob", Command::Defuse).await,
        Err(GameError::NotDefusable)
    );
    assert_eq!(handle.player_list().await.unwrap(), vec!["alice", "bob"]);
}

#[tokio::test(start_paused = true)]
async fn test_scores_rank_the_patient_holder() {
    let chat = Arc::new(TranscriptChat::new(true));
    let config = GameConfig {
        min_fuse_secs: 600,
        max_fuse_secs: 600,
        ..fixed_fuse_config()
    };
    let handle = spawn(config, &chat);

    start_with_players(&handle, &["alice", "bob"]).await;
    sleep(Duration::from_secs(5)).await;
    handle.throw("alice", "bob").await.unwrap();
    sleep(Duration::from_secs(20)).await;
    handle.throw("bob", "alice").await.unwrap();
    handle.leave("alice").await.unwrap();
    handle.stop().await.unwrap();

    let board = handle.scores(ScoreMode::Duration.calc()).await.unwrap();
    let leaders = board.leaderboard();
    assert_eq!(leaders.len(), 1);
    assert_eq!(leaders[0].nick, "bob");
    assert_eq!(leaders[0].score, 20);
}

#[tokio::test(start_paused = true)]
async fn test_close_ends_the_session() {
    let chat = Arc::new(TranscriptChat::new(true));
    let handle = spawn(GameConfig::default(), &chat);

    let warmup = handle.start_warmup().await.unwrap();
    handle.close().await.unwrap();

    assert_eq!(warmup.finished().await, Err(GameError::SessionClosed));
    assert_eq!(handle.join("alice").await, Err(GameError::SessionClosed));
}
