//! Default tunables for a pass-the-bomb round.

/// Seconds players get to join before the bomb goes live.
pub const DEFAULT_JOIN_WINDOW_SECS: u64 = 30;

/// Shortest initial fuse, in seconds.
pub const DEFAULT_MIN_FUSE_SECS: u64 = 30;

/// Longest initial fuse, in seconds.
pub const DEFAULT_MAX_FUSE_SECS: u64 = 600;

/// Percent chance that a bomb can be defused at all.
pub const DEFAULT_DEFUSE_CHANCE: u8 = 90;

pub const DEFAULT_MIN_WIRES: usize = 4;
pub const DEFAULT_MAX_WIRES: usize = 12;

/// Percent chance that a bomb is a dud.
pub const DEFAULT_FAKE_CHANCE: u8 = 10;

pub const DEFAULT_MIN_PLAYERS: usize = 4;

/// Seconds an exploded player stays banned.
pub const DEFAULT_BAN_SECS: u64 = 10;

/// How often the watchdog compares the clock against the fuse.
pub const DEFAULT_FUSE_CHECK_INTERVAL_SECS: u64 = 10;

/// Number of explanatory broadcasts during warm-up. The join window is
/// split into `EXPLAIN_TICKS + 1` equal slices.
pub const EXPLAIN_TICKS: u8 = 4;

/// Fuse window (seconds) after cutting a wire that shortens the timer.
pub const LESS_TIME_MIN_SECS: u64 = 20;
pub const LESS_TIME_MAX_SECS: u64 = 60;

/// Extra slack (seconds) a wire that extends the timer can add on top of
/// the remaining time.
pub const MORE_TIME_EXTRA_SECS: u64 = 5 * 60;

/// Prefix that marks a chat line as a game command.
pub const COMMAND_PREFIX: char = '!';
