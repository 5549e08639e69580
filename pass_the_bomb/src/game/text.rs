//! Everything the game says out loud.

use super::constants::COMMAND_PREFIX as P;

pub const START_ATTENTION: &str = "Fall in, recruits!";

pub fn start_join() -> String {
    format!("Somebody has to babysit this ticking package. Type {P}join to volunteer!")
}

pub const START_FAIL: &str = "Not enough volunteers. Mission scrubbed.";

pub fn start_go(first: &str) -> String {
    format!("Move it! {first}, catch! It's all yours now.")
}

pub fn help_throw() -> String {
    format!("Holding the bomb? Get rid of it with {P}pass <nick>.")
}

pub const HELP_SCORE: &str = "Points are earned by holding the bomb. Nerves of steel pay off.";

pub fn help_defuse() -> String {
    format!("Feeling brave? Type {P}defuse while you hold the bomb and try your luck with the wires.")
}

pub fn help_start(first: &str) -> String {
    format!("Stand by! {first} gets the bomb first.")
}

pub fn player_list(nicks: &str) -> String {
    format!("Squad: {nicks}")
}

pub const PLAYER_JOINED: &str = "You're in. Don't drop it.";

pub fn player_joined_late(nick: &str) -> String {
    format!("Heads up, {nick} joined late!")
}

pub fn player_renamed(old: &str, new: &str) -> String {
    format!("{old} now answers to {new}.")
}

pub fn player_left(nick: &str) -> String {
    format!("{nick} ran off. Coward.")
}

pub fn bomb_thrown_self(nick: &str) -> String {
    format!("{nick}, throwing it to yourself doesn't count.")
}

pub fn bomb_thrown(source: &str, target: &str) -> String {
    format!("{source} tosses the bomb to {target}!")
}

pub fn bomb_dropped(target: &str) -> String {
    format!("{target} isn't playing! The bomb hits the floor! ({P}pickup)")
}

pub fn bomb_abandoned(nick: &str) -> String {
    format!("{nick} left the bomb lying on the floor! ({P}pickup)")
}

pub fn bomb_picked_up(nick: &str) -> String {
    format!("{nick} scoops the bomb off the floor!")
}

pub const BOMB_EXPLODE: &str = "tick tick tick... *KABOOM*";

pub const BOMB_FAKE: &str = "tick tick tick... pfffft. It was a dud!";

pub fn bomb_explode_noop(nick: &str) -> String {
    format!("The bomb went off in {nick}'s hands!")
}

pub fn defuse_tried(nick: &str) -> String {
    format!("{nick}, you already had your shot at the wires.")
}

pub fn defuse_error(wire: u8) -> String {
    format!("There is no wire {wire}. Count again.")
}

pub fn defuse_disabled(nick: &str) -> String {
    format!("Sorry {nick}, this one can't be defused.")
}

pub fn defuse(wires: usize) -> String {
    format!("{wires} wires stare back at you. Pick one with {P}cut <number>.")
}

pub const DEFUSE_DUPLICATE: &str = "That wire is already cut. Nothing to see here.";

pub const DEFUSE_LESS_TIME: &str = "Uh oh. The timer just sped up!";

pub const DEFUSE_MORE_TIME: &str = "Phew, the timer slowed down a little.";

pub fn defuse_nothing(nick: &str) -> String {
    format!("Snip... nothing happened, {nick}.")
}

pub fn defuse_success(nick: &str) -> String {
    format!("{nick} cut the right wire! The bomb is safe!")
}
